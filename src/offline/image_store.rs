//! Image store — local save and rename of photos across file and record
//! storage.
//!
//! DESIGN
//! ======
//! Save: a photo without a key gets a temporary `hash-<n>` key and is
//! `localOnly`; a keyed photo came from the server. After one yield the
//! binary goes to the filesystem first and the record second, so a stored
//! record always points at a written file. Server photos drop their base64
//! payload once written; local-only photos keep it until the server has it.
//!
//! Rename: move the file, save the record under the new key, and only then
//! remove the old record. A failure at any step leaves the old record in
//! place.
//!
//! ERROR HANDLING
//! ==============
//! Failures are logged to the offline event log and returned; nothing is
//! retried or rolled back here.

use std::sync::Arc;

use crate::error::SyncError;
use crate::event_log::EventLog;
use crate::photo::PhotoMetadata;
use crate::utils::image::base64_to_blob;
use crate::utils::temporary_hash;

use super::cursor::LastUpdatedCursor;
use super::types::{KeyValueStore, LocalFilesystem, StoreError};

/// Directory photo files live in, relative to the filesystem root.
const ROOT_DIR: &str = ".";

#[derive(Clone)]
pub struct ImageStore {
    files: Arc<dyn LocalFilesystem>,
    db: Arc<dyn KeyValueStore>,
    cursor: LastUpdatedCursor,
    log: EventLog,
}

impl ImageStore {
    #[must_use]
    pub fn new(
        files: Arc<dyn LocalFilesystem>,
        db: Arc<dyn KeyValueStore>,
        cursor: LastUpdatedCursor,
        log: EventLog,
    ) -> Self {
        Self { files, db, cursor, log }
    }

    #[must_use]
    pub fn cursor(&self) -> &LastUpdatedCursor {
        &self.cursor
    }

    // =========================================================================
    // SAVE
    // =========================================================================

    /// Persist a photo locally and return the stored metadata.
    ///
    /// # Errors
    ///
    /// Missing or undecodable payloads, filesystem and record-store failures.
    pub async fn save(&self, mut photo: PhotoMetadata) -> Result<PhotoMetadata, SyncError> {
        let key = if let Some(key) = photo.key.clone() {
            photo.local_only = false;
            key
        } else {
            let key = temporary_hash();
            photo.key = Some(key.clone());
            photo.local_only = true;
            key
        };

        tokio::task::yield_now().await;

        self.write_and_record(&key, photo).await.inspect_err(|e| {
            self.log.error(format!("save failed for {key}: {e}"));
        })
    }

    async fn write_and_record(&self, key: &str, mut photo: PhotoMetadata) -> Result<PhotoMetadata, SyncError> {
        let Some(base64_photo) = photo.base64_photo.as_deref() else {
            return Err(StoreError::MissingPayload { key: key.to_owned() }.into());
        };
        let bytes = base64_to_blob(base64_photo)?;
        let mime_type = photo.mime_type.clone().unwrap_or_default();

        let entry = self.files.write(key, &bytes, &mime_type).await?;
        self.log.info(format!("write succeeded: {}", entry.uri));

        if !photo.local_only {
            photo.base64_photo = None;
        }
        photo.local_uri = Some(entry.uri);

        let record = photo.to_record().map_err(StoreError::from)?;
        self.db.remove(key).await?;
        self.db.save(key, &record).await?;

        if let Some(updated) = photo.updated.as_deref() {
            self.cursor.advance(updated).await?;
        }

        tracing::debug!(%key, local_only = photo.local_only, "photo saved");
        Ok(photo)
    }

    // =========================================================================
    // RENAME
    // =========================================================================

    /// Re-key a stored photo from `previous_key` to `photo.key`.
    ///
    /// # Errors
    ///
    /// Filesystem move or record-store failures; the old record survives any
    /// failure.
    pub async fn rename(&self, previous_key: &str, photo: PhotoMetadata) -> Result<PhotoMetadata, SyncError> {
        let Some(new_key) = photo.key.clone() else {
            return Err(StoreError::InvalidRecord(format!("rename of {previous_key} has no new key")).into());
        };

        match self.move_and_record(previous_key, &new_key, photo).await {
            Ok(photo) => {
                self.log.info(format!("renamed {previous_key} -> {new_key}"));
                Ok(photo)
            }
            Err(e) => {
                self.log.error(format!("rename {previous_key} -> {new_key} failed: {e}"));
                Err(e)
            }
        }
    }

    async fn move_and_record(
        &self,
        previous_key: &str,
        new_key: &str,
        mut photo: PhotoMetadata,
    ) -> Result<PhotoMetadata, SyncError> {
        let entry = self.files.mv(previous_key, ROOT_DIR, new_key).await?;
        photo.local_uri = Some(entry.uri);

        let record = photo.to_record().map_err(StoreError::from)?;
        self.db.save(new_key, &record).await?;

        // Only delete after the new record has saved.
        self.db.remove(previous_key).await?;
        Ok(photo)
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// # Errors
    ///
    /// Record-store failures or a record that is not photo metadata.
    pub async fn get(&self, key: &str) -> Result<Option<PhotoMetadata>, StoreError> {
        let Some(record) = self.db.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(PhotoMetadata::from_record(record)?))
    }

    /// Every stored photo, oldest save first.
    ///
    /// # Errors
    ///
    /// Record-store failures or a record that is not photo metadata.
    pub async fn all(&self) -> Result<Vec<PhotoMetadata>, StoreError> {
        let records = self.db.all().await?;
        records.into_iter().map(|r| PhotoMetadata::from_record(r).map_err(StoreError::from)).collect()
    }

    /// Raw bytes of a stored photo file.
    ///
    /// # Errors
    ///
    /// Filesystem failures, including a missing file.
    pub async fn read_file(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.files.read(key).await
    }
}

#[cfg(test)]
#[path = "image_store_test.rs"]
mod tests;
