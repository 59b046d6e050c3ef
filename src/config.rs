//! Configuration — static property names and environment-driven settings.
//!
//! DESIGN
//! ======
//! Wire property names and API identifiers are compile-time constants shared
//! by the api, offline and data modules. Deployment-specific values (API
//! root, storage locations, timeouts, retry budget) come from environment
//! variables with defaults, parsed once at startup by `AppConfig::from_env`.

use std::path::PathBuf;

// =============================================================================
// PROPERTY NAMES
// =============================================================================

pub const KEY_PROPERTY_NAME: &str = "key";
pub const TITLE_PROPERTY_NAME: &str = "title";
pub const DESCRIPTION_PROPERTY_NAME: &str = "description";
pub const TAGS_PROPERTY_NAME: &str = "tags";
pub const BASE64_PROPERTY_NAME: &str = "base64Photo";
pub const MIMETYPE_PROPERTY_NAME: &str = "mimeType";
pub const LOCAL_URI_PROPERTY_NAME: &str = "localUri";
pub const UPDATED_PROPERTY_NAME: &str = "updated";
pub const LAST_UPDATED_PROPERTY_NAME: &str = "lastUpdated";
pub const PAGE_TOKEN_PROPERTY_NAME: &str = "pageToken";
pub const NEXT_PAGE_TOKEN_PROPERTY_NAME: &str = "nextPageToken";
pub const LIMIT_PROPERTY_NAME: &str = "limit";
pub const ITEMS_PROPERTY_NAME: &str = "items";

// =============================================================================
// API
// =============================================================================

pub const API_NAME: &str = "picturesque";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_API_ROOT: &str = "http://localhost:8080/_ah/api";

// =============================================================================
// LOCAL STORAGE
// =============================================================================

/// Key-value namespace holding photo metadata records.
pub const PHOTO_NAMESPACE: &str = "PicturesqueApp.db";
/// Key-value namespace holding only the last-updated cursor.
pub const LAST_UPDATED_NAMESPACE: &str = "PicturesqueApp.lastUpdated";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://picturesque.db?mode=rwc";
pub const DEFAULT_FILES_DIR: &str = "picturesque-files";

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum upload width in pixels (landscape images).
pub const MAX_WIDTH: u32 = 600;
/// Maximum upload height in pixels (portrait and square images).
pub const MAX_HEIGHT: u32 = 400;
/// Attempts a task gets before it silently no-ops.
pub const DEFAULT_TASK_TRIES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Delay before an offline client tries the network again.
pub const DEFAULT_RECONNECT_SECS: u64 = 15;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "E_CONFIG_INVALID",
        }
    }
}

// =============================================================================
// RUNTIME CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_root: String,
    pub api_version: String,
    pub database_url: String,
    pub files_dir: PathBuf,
    pub task_tries: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub reconnect_secs: u64,
    /// Pre-issued OAuth access token for headless runs.
    pub access_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            files_dir: PathBuf::from(DEFAULT_FILES_DIR),
            task_tries: DEFAULT_TASK_TRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            reconnect_secs: DEFAULT_RECONNECT_SECS,
            access_token: None,
        }
    }
}

impl AppConfig {
    /// Build runtime config from environment variables.
    ///
    /// Optional:
    /// - `PICTURESQUE_API_ROOT`: default `http://localhost:8080/_ah/api`
    /// - `PICTURESQUE_API_VERSION`: default `v1`
    /// - `PICTURESQUE_DATABASE_URL`: `SQLite` URL for the key-value store
    /// - `PICTURESQUE_FILES_DIR`: directory for local photo files
    /// - `PICTURESQUE_TASK_TRIES`: attempts per task, default 3, must be > 0
    /// - `PICTURESQUE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PICTURESQUE_CONNECT_TIMEOUT_SECS`: default 10
    /// - `PICTURESQUE_RECONNECT_SECS`: offline retry delay, default 15
    /// - `PICTURESQUE_ACCESS_TOKEN`: token used to sign in without a browser
    ///
    /// # Errors
    ///
    /// Returns an error if `PICTURESQUE_TASK_TRIES` is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_root = std::env::var("PICTURESQUE_API_ROOT")
            .unwrap_or_else(|_| DEFAULT_API_ROOT.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let api_version = std::env::var("PICTURESQUE_API_VERSION").unwrap_or_else(|_| DEFAULT_API_VERSION.to_owned());
        let database_url =
            std::env::var("PICTURESQUE_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());
        let files_dir =
            PathBuf::from(std::env::var("PICTURESQUE_FILES_DIR").unwrap_or_else(|_| DEFAULT_FILES_DIR.to_owned()));

        let task_tries = env_parse("PICTURESQUE_TASK_TRIES", DEFAULT_TASK_TRIES);
        if task_tries == 0 {
            return Err(ConfigError::InvalidValue { var: "PICTURESQUE_TASK_TRIES", value: "0".into() });
        }

        let access_token = std::env::var("PICTURESQUE_ACCESS_TOKEN")
            .into_iter()
            .find(|token| !token.is_empty());

        Ok(Self {
            api_root,
            api_version,
            database_url,
            files_dir,
            task_tries,
            request_timeout_secs: env_parse("PICTURESQUE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_parse("PICTURESQUE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            reconnect_secs: env_parse("PICTURESQUE_RECONNECT_SECS", DEFAULT_RECONNECT_SECS),
            access_token,
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
