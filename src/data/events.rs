//! Photo notifications delivered to the rendering surface.

use tracing::{info, warn};

use crate::error::{ErrorCode, SyncError};
use crate::photo::PhotoMetadata;

/// Receives photo lifecycle events. Every method defaults to a no-op.
pub trait PhotoObserver: Send + Sync {
    /// A photo was stored locally (captured, or fetched from the server).
    fn photo_saved(&self, _photo: &PhotoMetadata) {}

    /// A previously stored photo was read back during local enumeration.
    fn photo_loaded(&self, _photo: &PhotoMetadata) {}

    /// A local photo received its server key.
    fn photo_renamed(&self, _previous_key: &str, _photo: &PhotoMetadata) {}

    fn save_failed(&self, _error: &SyncError) {}

    /// Remote paging reached the last page.
    fn photos_complete(&self) {}
}

/// Observer that only emits tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PhotoObserver for TracingObserver {
    fn photo_saved(&self, photo: &PhotoMetadata) {
        info!(key = ?photo.key, local_only = photo.local_only, "photo saved");
    }

    fn photo_loaded(&self, photo: &PhotoMetadata) {
        info!(key = ?photo.key, "photo loaded");
    }

    fn photo_renamed(&self, previous_key: &str, photo: &PhotoMetadata) {
        info!(%previous_key, key = ?photo.key, "photo renamed");
    }

    fn save_failed(&self, error: &SyncError) {
        warn!(code = error.error_code(), %error, "photo save failed");
    }

    fn photos_complete(&self) {
        info!("remote photos complete");
    }
}
