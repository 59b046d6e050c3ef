//! Last-updated cursor — bounds incremental remote fetches.
//!
//! DESIGN
//! ======
//! A single record in its own namespace keeps the photo namespace clean.
//! Timestamps are ISO-8601 without a trailing `Z`, the form the server
//! expects. `advance` only moves forward; `set` overwrites unconditionally
//! and defaults to "now" when paging completes.
//!
//! ERROR HANDLING
//! ==============
//! An unparsable stored value is replaced by any parsable proposal. An
//! unparsable proposal is logged and skipped.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::json;

use crate::config::{KEY_PROPERTY_NAME, LAST_UPDATED_PROPERTY_NAME};
use crate::event_log::EventLog;

use super::types::{KeyValueStore, StoreError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Clone)]
pub struct LastUpdatedCursor {
    store: Arc<dyn KeyValueStore>,
    log: EventLog,
}

impl LastUpdatedCursor {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, log: EventLog) -> Self {
        Self { store, log }
    }

    /// Current cursor value, if one has been stored.
    ///
    /// # Errors
    ///
    /// Propagates key-value store failures.
    pub async fn get(&self) -> Result<Option<String>, StoreError> {
        let record = self.store.get(LAST_UPDATED_PROPERTY_NAME).await?;
        Ok(record
            .as_ref()
            .and_then(|r| r.get(LAST_UPDATED_PROPERTY_NAME))
            .and_then(|v| v.as_str())
            .map(str::to_owned))
    }

    /// Overwrite the cursor; `None` stores the current UTC time.
    ///
    /// # Errors
    ///
    /// Propagates key-value store failures.
    pub async fn set(&self, last_updated: Option<&str>) -> Result<String, StoreError> {
        let value = last_updated.map_or_else(now_timestamp, str::to_owned);

        // Remove first so the record is re-appended rather than duplicated.
        self.store.remove(LAST_UPDATED_PROPERTY_NAME).await?;
        let record = json!({
            KEY_PROPERTY_NAME: LAST_UPDATED_PROPERTY_NAME,
            LAST_UPDATED_PROPERTY_NAME: value,
        });
        self.store.save(LAST_UPDATED_PROPERTY_NAME, &record).await?;
        Ok(value)
    }

    /// Move the cursor to `proposed` if it is newer than the stored value.
    /// Returns whether the cursor changed.
    ///
    /// # Errors
    ///
    /// Propagates key-value store failures.
    pub async fn advance(&self, proposed: &str) -> Result<bool, StoreError> {
        let Some(proposed_at) = parse_timestamp(proposed) else {
            self.log.error(format!("ignoring unparsable updated timestamp: {proposed:?}"));
            return Ok(false);
        };

        if let Some(current) = self.get().await? {
            if parse_timestamp(&current).is_some_and(|current_at| proposed_at <= current_at) {
                return Ok(false);
            }
        }

        self.set(Some(proposed)).await?;
        Ok(true)
    }
}

/// Current UTC time in the server's timestamp format.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Parse a server timestamp, with or without a trailing `Z` or offset.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(naive, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.naive_utc()))
}

#[cfg(test)]
#[path = "cursor_test.rs"]
mod tests;
