//! Offline storage types — errors and the two storage seams.

use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Save was asked to write a photo without base64 contents.
    #[error("photo {key} has no base64 payload")]
    MissingPayload { key: String },

    #[error("not found: {0}")]
    NotFound(String),
}

impl crate::error::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORE_IO",
            Self::Database(_) => "E_STORE_DATABASE",
            Self::Serde(_) => "E_STORE_SERDE",
            Self::InvalidRecord(_) => "E_STORE_INVALID_RECORD",
            Self::MissingPayload { .. } => "E_STORE_MISSING_PAYLOAD",
            Self::NotFound(_) => "E_STORE_NOT_FOUND",
        }
    }
}

// =============================================================================
// SEAMS
// =============================================================================

/// A stored file, addressed by photo key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub key: String,
    /// URI the UI can load the file from.
    pub uri: String,
}

/// Local file storage for photo binaries.
#[async_trait::async_trait]
pub trait LocalFilesystem: Send + Sync {
    async fn write(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<FileEntry, StoreError>;

    /// Move `old_key` to `new_key` inside `dir` (`"."` is the root).
    async fn mv(&self, old_key: &str, dir: &str, new_key: &str) -> Result<FileEntry, StoreError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Local key-value store for JSON records within one namespace.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn save(&self, key: &str, record: &Value) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every record, oldest save first.
    async fn all(&self) -> Result<Vec<Value>, StoreError>;
}
