use super::*;
use crate::offline::{MemoryFilesystem, MemoryKeyValueStore};
use crate::utils::hash::is_temporary_key;
use serde_json::Value;
use std::sync::Mutex;

// =============================================================================
// HELPERS
// =============================================================================

/// Record store that yields inside `save` and journals every operation.
#[derive(Default)]
struct JournalStore {
    inner: MemoryKeyValueStore,
    journal: Mutex<Vec<String>>,
}

impl JournalStore {
    fn note(&self, entry: String) {
        self.journal.lock().unwrap().push(entry);
    }

    fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JournalStore {
    async fn save(&self, key: &str, record: &Value) -> Result<(), StoreError> {
        self.note(format!("save-start:{key}"));
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        self.inner.save(key, record).await?;
        self.note(format!("save-done:{key}"));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.note(format!("remove:{key}"));
        self.inner.remove(key).await
    }

    async fn all(&self) -> Result<Vec<Value>, StoreError> {
        self.inner.all().await
    }
}

struct Fixture {
    store: ImageStore,
    files: MemoryFilesystem,
    db: Arc<JournalStore>,
    cursor_db: MemoryKeyValueStore,
}

fn fixture() -> Fixture {
    let files = MemoryFilesystem::new();
    let db = Arc::new(JournalStore::default());
    let cursor_db = MemoryKeyValueStore::new();
    let log = EventLog::new("test.offline");
    let cursor = LastUpdatedCursor::new(Arc::new(cursor_db.clone()), log.clone());
    let store = ImageStore::new(Arc::new(files.clone()), db.clone(), cursor, log);
    Fixture { store, files, db, cursor_db }
}

fn captured() -> PhotoMetadata {
    // "hello" in base64
    PhotoMetadata::captured("Sunset", "aGVsbG8=", "image/png", None)
}

// =============================================================================
// SAVE
// =============================================================================

#[tokio::test]
async fn save_without_key_assigns_temporary_key_and_keeps_payload() {
    let fx = fixture();
    let saved = fx.store.save(captured()).await.unwrap();

    let key = saved.key.clone().unwrap();
    assert!(is_temporary_key(&key));
    assert!(saved.local_only);
    assert_eq!(saved.base64_photo.as_deref(), Some("aGVsbG8="));
    assert_eq!(saved.local_uri.as_deref(), Some(format!("memory:///{key}").as_str()));
    assert_eq!(fx.files.mime_type(&key).as_deref(), Some("image/png"));

    let stored = fx.store.get(&key).await.unwrap().unwrap();
    assert_eq!(stored, saved);
}

#[tokio::test]
async fn save_of_server_photo_strips_payload_and_advances_cursor() {
    let fx = fixture();
    let mut photo = captured();
    photo.key = Some("server1".into());
    photo.updated = Some("2013-06-01T10:00:00".into());

    let saved = fx.store.save(photo).await.unwrap();

    assert!(!saved.local_only);
    assert!(saved.base64_photo.is_none());
    assert_eq!(fx.store.read_file("server1").await.unwrap(), b"hello");
    assert_eq!(fx.store.cursor().get().await.unwrap().as_deref(), Some("2013-06-01T10:00:00"));
    assert_eq!(fx.cursor_db.keys(), vec!["lastUpdated"]);
}

#[tokio::test]
async fn save_without_payload_fails_and_writes_nothing() {
    let fx = fixture();
    let photo = PhotoMetadata { key: Some("server1".into()), ..PhotoMetadata::default() };

    let err = fx.store.save(photo).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::MissingPayload { .. })));
    assert!(!fx.files.contains("server1"));
    assert!(fx.store.all().await.unwrap().is_empty());
    assert!(fx.store.log.contains("save failed for server1"));
}

#[tokio::test]
async fn save_with_bad_base64_is_an_image_error() {
    let fx = fixture();
    let photo = PhotoMetadata::captured("Bad", "%%%", "image/png", None);
    assert!(matches!(fx.store.save(photo).await, Err(SyncError::Image(_))));
}

// =============================================================================
// RENAME
// =============================================================================

#[tokio::test]
async fn rename_removes_old_record_only_after_new_save_completes() {
    let fx = fixture();
    let saved = fx.store.save(captured()).await.unwrap();
    let old_key = saved.key.clone().unwrap();

    let mut renamed = saved.clone();
    renamed.key = Some("server123".into());
    renamed.local_only = false;
    renamed.base64_photo = None;
    let result = fx.store.rename(&old_key, renamed).await.unwrap();

    assert_eq!(result.local_uri.as_deref(), Some("memory:///server123"));
    let journal = fx.db.journal();
    let save_done = journal.iter().position(|e| e == "save-done:server123").unwrap();
    // The save itself clears the key first; the rename's remove is the last one.
    let removed = journal.iter().rposition(|e| *e == format!("remove:{old_key}")).unwrap();
    assert!(save_done < removed, "journal: {journal:?}");

    assert!(fx.store.get(&old_key).await.unwrap().is_none());
    let stored = fx.store.get("server123").await.unwrap().unwrap();
    assert!(!stored.local_only);
    assert!(stored.base64_photo.is_none());
    assert!(fx.files.contains("server123"));
}

#[tokio::test]
async fn failed_move_keeps_old_record() {
    let fx = fixture();
    let saved = fx.store.save(captured()).await.unwrap();
    let old_key = saved.key.clone().unwrap();
    fx.files.remove(&old_key).await.unwrap();

    let mut renamed = saved;
    renamed.key = Some("server123".into());
    assert!(fx.store.rename(&old_key, renamed).await.is_err());

    assert!(fx.store.get(&old_key).await.unwrap().is_some());
    assert!(fx.store.get("server123").await.unwrap().is_none());
}

#[tokio::test]
async fn rename_requires_a_new_key() {
    let fx = fixture();
    let err = fx.store.rename("hash-1", PhotoMetadata::default()).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::InvalidRecord(_))));
}
