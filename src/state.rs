//! Shared application state — the explicitly constructed service graph.
//!
//! DESIGN
//! ======
//! `AppState` wires the api, offline and data services together once at
//! startup. `connect` builds the production graph (HTTP transport, `SQLite`
//! records, files on disk); `assemble` takes every collaborator as an
//! argument so tests and embedders can substitute their own.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{
    ApiError, AuthResult, HttpRpcTransport, PicturesqueApi, RpcTransport, SigninHandler, SigninOutcome, TokenStore,
};
use crate::config::{AppConfig, ConfigError, LAST_UPDATED_NAMESPACE, PHOTO_NAMESPACE};
use crate::data::{ApiGate, DataStore, PhotoObserver};
use crate::error::SyncError;
use crate::event_log::EventLog;
use crate::offline::{
    Connectivity, ImageStore, KeyValueStore, LastUpdatedCursor, LocalFilesystem, NetworkQueue,
    SqliteKeyValueStore, StoreError, TokioFilesystem, spawn_online_listener, spawn_reconnect_timer,
};
use crate::photo::PhotoMetadata;
use crate::utils::CallbackList;
use crate::utils::image::{base64_contents_and_mime_type, sniff_mime_type};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl crate::error::ErrorCode for StartupError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Database(_) => "E_STARTUP_DATABASE",
            Self::Api(e) => e.error_code(),
        }
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// External collaborators the service graph is built on.
pub struct Collaborators {
    pub transport: Arc<dyn RpcTransport>,
    pub tokens: TokenStore,
    pub files: Arc<dyn LocalFilesystem>,
    pub photo_db: Arc<dyn KeyValueStore>,
    pub cursor_db: Arc<dyn KeyValueStore>,
    pub connectivity: Connectivity,
    pub observer: Arc<dyn PhotoObserver>,
}

// =============================================================================
// APP STATE
// =============================================================================

#[derive(Clone)]
pub struct AppState {
    pub data: DataStore,
    pub gate: ApiGate,
    pub network: NetworkQueue,
    pub signin: Arc<SigninHandler>,
    /// Fired each time connectivity comes back, before the network queue
    /// restarts.
    pub on_online: CallbackList,
    pub log: EventLog,
    reconnect_after: Duration,
}

impl AppState {
    /// Build the production graph from config.
    ///
    /// # Errors
    ///
    /// Database connection or migration failures, or an unbuildable HTTP
    /// client.
    pub async fn connect(config: &AppConfig, observer: Arc<dyn PhotoObserver>) -> Result<Self, StartupError> {
        let pool = crate::db::init_pool(&config.database_url).await?;
        let tokens = TokenStore::default();
        let transport = HttpRpcTransport::new(config, tokens.clone())?;

        let collaborators = Collaborators {
            transport: Arc::new(transport),
            tokens,
            files: Arc::new(TokioFilesystem::new(&config.files_dir)),
            photo_db: Arc::new(SqliteKeyValueStore::new(pool.clone(), PHOTO_NAMESPACE)),
            cursor_db: Arc::new(SqliteKeyValueStore::new(pool, LAST_UPDATED_NAMESPACE)),
            connectivity: Connectivity::new(true),
            observer,
        };
        Ok(Self::assemble(config, collaborators))
    }

    /// Wire the services over the given collaborators.
    #[must_use]
    pub fn assemble(config: &AppConfig, collaborators: Collaborators) -> Self {
        let Collaborators { transport, tokens, files, photo_db, cursor_db, connectivity, observer } = collaborators;
        let log = EventLog::new("app");

        let api = PicturesqueApi::new(transport, config.api_version.clone(), log.scoped("api"));
        let offline_log = log.scoped("offline");
        let network = NetworkQueue::new(connectivity, offline_log.clone());
        let cursor = LastUpdatedCursor::new(cursor_db, offline_log.clone());
        let images = ImageStore::new(files, photo_db, cursor, offline_log);

        let data_log = log.scoped("data");
        let gate = ApiGate::new(api, network.clone(), config.task_tries, data_log.clone());
        let data = DataStore::new(images, gate.clone(), observer, data_log);
        let signin = Arc::new(SigninHandler::new(tokens, Arc::new(gate.clone()), log.scoped("api")));

        Self {
            data,
            gate,
            network,
            signin,
            on_online: CallbackList::new(),
            log,
            reconnect_after: Duration::from_secs(config.reconnect_secs),
        }
    }

    /// Restart the network queue whenever connectivity returns.
    #[must_use]
    pub fn spawn_online_listener(&self) -> JoinHandle<()> {
        spawn_online_listener(self.network.clone(), self.on_online.clone())
    }

    /// Retry the network after each drop to offline.
    #[must_use]
    pub fn spawn_reconnect_timer(&self) -> JoinHandle<()> {
        spawn_reconnect_timer(self.network.connectivity().clone(), self.reconnect_after)
    }

    pub async fn sign_in(&self, access_token: &str) -> SigninOutcome {
        self.signin.handle(AuthResult::token(access_token)).await
    }

    /// Capture an image file from disk as a new photo titled by its file stem.
    ///
    /// # Errors
    ///
    /// Unreadable or undecodable files, and local save failures.
    pub async fn import_file(&self, path: &Path) -> Result<PhotoMetadata, SyncError> {
        let bytes = tokio::fs::read(path).await.map_err(StoreError::from)?;
        let mime_type = sniff_mime_type(&bytes)?;
        let (base64_photo, mime_type) = base64_contents_and_mime_type(&bytes, mime_type)?;
        let title = path.file_stem().map_or_else(|| "untitled".into(), |s| s.to_string_lossy().into_owned());

        self.data.add_photo(&title, &base64_photo, &mime_type, None).await
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
