//! In-memory storage backends for tests and embedders without a disk.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::types::{FileEntry, KeyValueStore, LocalFilesystem, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// =============================================================================
// FILESYSTEM
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryFilesystem {
    files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryFilesystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.files).contains_key(key)
    }

    #[must_use]
    pub fn mime_type(&self, key: &str) -> Option<String> {
        lock(&self.files).get(key).map(|(_, mime)| mime.clone())
    }

    fn uri(key: &str) -> String {
        format!("memory:///{key}")
    }
}

#[async_trait::async_trait]
impl LocalFilesystem for MemoryFilesystem {
    async fn write(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<FileEntry, StoreError> {
        lock(&self.files).insert(key.to_owned(), (bytes.to_vec(), mime_type.to_owned()));
        Ok(FileEntry { key: key.to_owned(), uri: Self::uri(key) })
    }

    async fn mv(&self, old_key: &str, dir: &str, new_key: &str) -> Result<FileEntry, StoreError> {
        let target = super::disk::join_key(dir, new_key);
        let mut files = lock(&self.files);
        let Some(file) = files.remove(old_key) else {
            return Err(StoreError::NotFound(old_key.to_owned()));
        };
        files.insert(target.clone(), file);
        Ok(FileEntry { uri: Self::uri(&target), key: target })
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        lock(&self.files)
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_owned()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.files).remove(key);
        Ok(())
    }
}

// =============================================================================
// KEY-VALUE
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    records: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        lock(&self.records).iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn save(&self, key: &str, record: &Value) -> Result<(), StoreError> {
        let mut records = lock(&self.records);
        records.retain(|(k, _)| k != key);
        records.push((key.to_owned(), record.clone()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(lock(&self.records).iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.records).retain(|(k, _)| k != key);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Value>, StoreError> {
        Ok(lock(&self.records).iter().map(|(_, v)| v.clone()).collect())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
