use std::path::PathBuf;
use std::sync::Arc;

use picturesque::config::AppConfig;
use picturesque::data::TracingObserver;
use picturesque::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let config = AppConfig::from_env()?;
    let state = AppState::connect(&config, Arc::new(TracingObserver)).await?;

    // Restart the network queue whenever connectivity returns, and probe
    // again after the server stops answering.
    let _online = state.spawn_online_listener();
    let _reconnect = state.spawn_reconnect_timer();

    if let Some(token) = config.access_token.as_deref() {
        let outcome = state.sign_in(token).await;
        tracing::info!(?outcome, "sign-in handled");
    } else {
        tracing::warn!("PICTURESQUE_ACCESS_TOKEN not set; uploads wait for sign-in");
    }

    let resumed = state.data.resume_local_only().await?;
    tracing::info!(resumed, "local-only photos queued");

    for path in std::env::args().skip(1).map(PathBuf::from) {
        match state.import_file(&path).await {
            Ok(photo) => tracing::info!(path = %path.display(), key = ?photo.key, "photo captured"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "import failed"),
        }
    }

    state.data.get_photos().await;

    tracing::info!(api_root = %config.api_root, "picturesque running; ctrl-c to exit");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
