//! Error codes and the umbrella sync error.
//!
//! DESIGN
//! ======
//! Each concern owns its error enum (`ApiError`, `StoreError`, `ImageError`,
//! `ConfigError`). Task actions cross all of them, so they return
//! `SyncError`, which wraps each via `#[from]` and keeps `?` usable in the
//! save → create → rename pipeline.

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::offline::StoreError;
use crate::utils::image::ImageError;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for logged failures.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// SYNC ERROR
// =============================================================================

/// Any failure a queued task can report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ErrorCode for SyncError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Image(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::Store(e) => e.retryable(),
            Self::Image(e) => e.retryable(),
            Self::Config(e) => e.retryable(),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
