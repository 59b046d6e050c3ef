//! Shared fakes for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::api::{ApiError, RpcTransport};
use crate::data::PhotoObserver;
use crate::photo::PhotoMetadata;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Transport answering from per-method scripts and recording every call.
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<(String, Value)>>,
    queued: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
    fallback: Mutex<HashMap<String, Value>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer the next call to `method` with `value`.
    pub fn respond(&self, method: &str, value: Value) {
        self.queue(method, Ok(value));
    }

    /// Fail the next call to `method`.
    pub fn fail(&self, method: &str, error: ApiError) {
        self.queue(method, Err(error));
    }

    /// Answer every call to `method` with `value` once its queue is empty.
    pub fn always(&self, method: &str, value: Value) {
        self.fallback.lock().unwrap().insert(method.to_owned(), value);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }

    fn queue(&self, method: &str, response: Result<Value, ApiError>) {
        self.queued.lock().unwrap().entry(method.to_owned()).or_default().push_back(response);
    }
}

#[async_trait::async_trait]
impl RpcTransport for ScriptedTransport {
    async fn execute(&self, method: &str, _api_version: &str, params: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push((method.to_owned(), params));

        let queued = self.queued.lock().unwrap().get_mut(method).and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return response;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .ok_or_else(|| ApiError::Transport(format!("no scripted response for {method}")))
    }
}

// =============================================================================
// OBSERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Saved(PhotoMetadata),
    Loaded(PhotoMetadata),
    Renamed(String, PhotoMetadata),
    SaveFailed(String),
    Complete,
}

/// Observer recording every notification in order.
#[derive(Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Seen>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn renamed(&self) -> Vec<(String, PhotoMetadata)> {
        self.seen()
            .into_iter()
            .filter_map(|s| match s {
                Seen::Renamed(old, meta) => Some((old, meta)),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.seen().iter().filter(|s| matches!(s, Seen::Complete)).count()
    }

    fn push(&self, seen: Seen) {
        self.seen.lock().unwrap().push(seen);
    }
}

impl PhotoObserver for RecordingObserver {
    fn photo_saved(&self, photo: &PhotoMetadata) {
        self.push(Seen::Saved(photo.clone()));
    }

    fn photo_loaded(&self, photo: &PhotoMetadata) {
        self.push(Seen::Loaded(photo.clone()));
    }

    fn photo_renamed(&self, previous_key: &str, photo: &PhotoMetadata) {
        self.push(Seen::Renamed(previous_key.to_owned(), photo.clone()));
    }

    fn save_failed(&self, error: &crate::error::SyncError) {
        self.push(Seen::SaveFailed(error.to_string()));
    }

    fn photos_complete(&self) {
        self.push(Seen::Complete);
    }
}
