use super::*;
use crate::api::{ApiError, PicturesqueApi};
use crate::offline::{
    Connectivity, KeyValueStore, LastUpdatedCursor, MemoryFilesystem, MemoryKeyValueStore, NetworkQueue,
};
use crate::testing::{RecordingObserver, ScriptedTransport, Seen};
use crate::utils::hash::is_temporary_key;
use serde_json::json;

const JOIN: &str = "picturesque.users.join";
const CREATE: &str = "picturesque.photo.create";
const LIST: &str = "picturesque.photo.list";

struct Fixture {
    store: DataStore,
    transport: Arc<ScriptedTransport>,
    observer: Arc<RecordingObserver>,
    db: MemoryKeyValueStore,
    files: MemoryFilesystem,
}

fn fixture() -> Fixture {
    let log = EventLog::new("test.data");
    let transport = ScriptedTransport::new();
    transport.always(JOIN, json!({}));
    let observer = RecordingObserver::new();

    let files = MemoryFilesystem::new();
    let db = MemoryKeyValueStore::new();
    let cursor = LastUpdatedCursor::new(Arc::new(MemoryKeyValueStore::new()), log.scoped("test.offline"));
    let images = ImageStore::new(Arc::new(files.clone()), Arc::new(db.clone()), cursor, log.scoped("test.offline"));

    let api = PicturesqueApi::new(transport.clone(), "v1", log.scoped("test.api"));
    let network = NetworkQueue::new(Connectivity::new(true), log.scoped("test.offline"));
    let gate = ApiGate::new(api, network, 3, log.clone());

    let store = DataStore::new(images, gate, observer.clone(), log);
    Fixture { store, transport, observer, db, files }
}

fn remote_item(key: &str, updated: &str) -> serde_json::Value {
    json!({"key": key, "title": key, "base64Photo": "aGVsbG8=", "mimeType": "image/png", "updated": updated, "isMine": true})
}

// =============================================================================
// CAPTURE → CREATE → RENAME
// =============================================================================

#[tokio::test]
async fn captured_photo_is_created_and_renamed_to_server_key() {
    let fx = fixture();
    fx.transport.respond(CREATE, json!({"key": "server123", "updated": "2013-06-01T10:00:00", "tags": ["beach"]}));
    fx.store.gate().join().await;

    let saved = fx.store.add_photo("Sunset", "aGVsbG8=", "image/png", Some("at the beach")).await.unwrap();
    let temp_key = saved.key.clone().unwrap();
    assert!(is_temporary_key(&temp_key));
    assert!(saved.local_only);

    let stored = fx.store.images().get("server123").await.unwrap().unwrap();
    assert_eq!(stored.key.as_deref(), Some("server123"));
    assert!(!stored.local_only);
    assert!(stored.base64_photo.is_none());
    assert_eq!(stored.updated.as_deref(), Some("2013-06-01T10:00:00"));
    assert_eq!(stored.tags, vec!["beach"]);

    let record = fx.db.get("server123").await.unwrap().unwrap();
    assert!(record.get("base64Photo").is_none());
    assert_eq!(record["localOnly"], false);
    assert!(fx.store.images().get(&temp_key).await.unwrap().is_none());
    assert!(fx.files.contains("server123"));

    let renamed = fx.observer.renamed();
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].0, temp_key);
    assert_eq!(fx.transport.calls()[1].1["description"], "at the beach");
}

#[tokio::test]
async fn create_waits_for_join() {
    let fx = fixture();
    fx.transport.respond(CREATE, json!({"key": "server123"}));

    let saved = fx.store.add_photo("Sunset", "aGVsbG8=", "image/png", None).await.unwrap();
    assert_eq!(fx.transport.count(CREATE), 0);
    assert_eq!(fx.store.gate().join_queue().labels(), vec!["photo.create"]);
    assert!(fx.store.images().get(saved.key.as_deref().unwrap()).await.unwrap().is_some());

    fx.store.gate().join().await;

    assert_eq!(fx.transport.count(CREATE), 1);
    assert!(fx.store.images().get("server123").await.unwrap().is_some());
}

#[tokio::test]
async fn failed_local_save_notifies_and_skips_create() {
    let fx = fixture();
    fx.store.gate().join().await;

    let result = fx.store.add_photo("Broken", "%%%", "image/png", None).await;

    assert!(result.is_err());
    assert!(matches!(fx.observer.seen().as_slice(), [Seen::SaveFailed(_)]));
    assert_eq!(fx.transport.count(CREATE), 0);
}

#[tokio::test]
async fn create_response_without_key_leaves_photo_local() {
    let fx = fixture();
    fx.transport.respond(CREATE, json!({"title": "no key"}));
    fx.store.gate().join().await;

    let saved = fx.store.add_photo("Sunset", "aGVsbG8=", "image/png", None).await.unwrap();

    let stored = fx.store.images().get(saved.key.as_deref().unwrap()).await.unwrap().unwrap();
    assert!(stored.local_only);
    assert!(fx.store.log().contains("has no key"));
}

#[tokio::test]
async fn resume_local_only_skips_photos_with_create_in_flight() {
    let fx = fixture();
    fx.transport.respond(CREATE, json!({"key": "server1"}));
    fx.transport.respond(CREATE, json!({"key": "server2"}));
    let one = fx.store.add_photo("One", "aGVsbG8=", "image/png", None).await.unwrap();
    let two = fx.store.add_photo("Two", "aGVsbG8=", "image/png", None).await.unwrap();
    assert_eq!(fx.store.gate().join_queue().len(), 2);
    assert!(fx.store.is_creating(one.key.as_deref().unwrap()));

    assert_eq!(fx.store.resume_local_only().await.unwrap(), 0);
    assert_eq!(fx.store.gate().join_queue().len(), 2);

    fx.store.gate().join().await;

    assert_eq!(fx.transport.count(CREATE), 2);
    assert!(fx.store.images().get("server1").await.unwrap().is_some());
    assert!(fx.store.images().get("server2").await.unwrap().is_some());
    assert_eq!(fx.observer.renamed().len(), 2);
    assert!(!fx.store.is_creating(one.key.as_deref().unwrap()));
    assert!(!fx.store.is_creating(two.key.as_deref().unwrap()));
}

#[tokio::test]
async fn abandoned_create_is_resumed() {
    let fx = fixture();
    fx.store.gate().join().await;
    for _ in 0..3 {
        fx.transport.fail(CREATE, ApiError::Backend { code: Some(503), message: "busy".into() });
    }

    let saved = fx.store.add_photo("Sunset", "aGVsbG8=", "image/png", None).await.unwrap();
    let temp_key = saved.key.unwrap();
    assert_eq!(fx.transport.count(CREATE), 3);
    assert!(!fx.store.is_creating(&temp_key));
    assert!(fx.store.log().contains("gave up"));

    fx.transport.respond(CREATE, json!({"key": "server123"}));
    assert_eq!(fx.store.resume_local_only().await.unwrap(), 1);

    assert_eq!(fx.transport.count(CREATE), 4);
    assert!(fx.store.images().get("server123").await.unwrap().is_some());
    assert!(fx.store.images().get(&temp_key).await.unwrap().is_none());
}

// =============================================================================
// LIST
// =============================================================================

#[tokio::test]
async fn get_photos_loads_local_then_pages_remote() {
    let fx = fixture();
    fx.store.gate().join().await;
    fx.store.images().cursor().set(Some("2013-01-01T00:00:00")).await.unwrap();
    let mut local = PhotoMetadata::captured("Local", "aGVsbG8=", "image/png", None);
    local.key = Some("local1".into());
    fx.store.images().save(local).await.unwrap();

    fx.transport.respond(LIST, json!({"items": [remote_item("r1", "2013-06-01T00:00:00")], "nextPageToken": "p2"}));
    fx.transport.respond(LIST, json!({"items": [remote_item("r2", "2013-06-02T00:00:00")]}));

    fx.store.get_photos().await;

    let lists: Vec<_> = fx.transport.calls().into_iter().filter(|(m, _)| m == LIST).map(|(_, p)| p).collect();
    assert_eq!(lists[0], json!({"lastUpdated": "2013-01-01T00:00:00"}));
    assert_eq!(lists[1], json!({"lastUpdated": "2013-01-01T00:00:00", "pageToken": "p2"}));

    let seen = fx.observer.seen();
    assert!(matches!(&seen[0], Seen::Loaded(p) if p.key.as_deref() == Some("local1")));
    assert_eq!(fx.observer.completions(), 1);

    let r2 = fx.store.images().get("r2").await.unwrap().unwrap();
    assert!(r2.base64_photo.is_none());
    assert_eq!(r2.extra["isMine"], true);

    // Final page moves the cursor to "now", past every item.
    let cursor = fx.store.images().cursor().get().await.unwrap().unwrap();
    assert!(cursor.as_str() > "2013-06-02T00:00:00");
}

#[tokio::test]
async fn later_get_photos_uses_cursor_and_limit_one() {
    let fx = fixture();
    fx.store.gate().join().await;
    fx.transport.always(LIST, json!({"items": []}));

    fx.store.get_photos().await;
    fx.store.get_photos().await;

    let lists: Vec<_> = fx.transport.calls().into_iter().filter(|(m, _)| m == LIST).map(|(_, p)| p).collect();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0], json!({}));
    assert_eq!(lists[1]["limit"], 1);
    assert!(lists[1]["lastUpdated"].is_string());
    assert_eq!(fx.observer.completions(), 2);
}

#[tokio::test]
async fn remote_list_requires_local_enumeration() {
    let fx = fixture();
    fx.store.gate().join().await;

    fx.store.get_remote_photos(None, None, None).await;

    assert_eq!(fx.transport.count(LIST), 0);
    assert!(fx.store.log().contains("called before getLocalComplete"));
}

#[tokio::test]
async fn failed_list_page_is_retried() {
    let fx = fixture();
    fx.store.gate().join().await;
    fx.transport.fail(LIST, ApiError::Backend { code: Some(503), message: "busy".into() });
    fx.transport.respond(LIST, json!({"items": [remote_item("r1", "2013-06-01T00:00:00")]}));

    fx.store.get_photos().await;

    assert_eq!(fx.transport.count(LIST), 2);
    assert_eq!(fx.observer.completions(), 1);
    assert!(fx.store.images().get("r1").await.unwrap().is_some());
}

#[tokio::test]
async fn list_before_join_is_parked() {
    let fx = fixture();
    fx.transport.always(LIST, json!({"items": []}));

    fx.store.get_photos().await;
    assert_eq!(fx.transport.count(LIST), 0);
    assert_eq!(fx.store.gate().join_queue().labels(), vec!["photo.list"]);

    // A second request while the first is parked is dropped.
    fx.store.get_photos().await;
    assert_eq!(fx.store.gate().join_queue().len(), 1);
    assert!(fx.store.log().contains("while getRemoteInProgress"));

    fx.store.gate().join().await;
    assert_eq!(fx.transport.count(LIST), 1);
    assert_eq!(fx.observer.completions(), 1);
}

#[tokio::test]
async fn list_parked_offline_keeps_remote_guard() {
    let fx = fixture();
    fx.store.gate().join().await;
    fx.transport.fail(LIST, ApiError::Transport("connection refused".into()));

    fx.store.get_photos().await;
    let network = fx.store.gate().network();
    assert!(!network.connectivity().is_online());
    assert_eq!(network.queue().labels(), vec!["photo.list"]);

    // The parked page still owns the fetch.
    fx.store.get_photos().await;
    assert_eq!(fx.transport.count(LIST), 1);
    assert!(fx.store.log().contains("while getRemoteInProgress"));

    fx.transport.respond(LIST, json!({"items": [remote_item("r1", "2013-06-01T00:00:00")]}));
    network.connectivity().set_online(true);
    network.start().await;

    assert_eq!(fx.transport.count(LIST), 2);
    assert_eq!(fx.observer.completions(), 1);
    assert!(fx.store.images().get("r1").await.unwrap().is_some());
}

#[tokio::test]
async fn abandoned_list_releases_remote_guard() {
    let fx = fixture();
    fx.store.gate().join().await;
    for _ in 0..3 {
        fx.transport.fail(LIST, ApiError::Backend { code: Some(503), message: "busy".into() });
    }

    fx.store.get_photos().await;
    assert_eq!(fx.transport.count(LIST), 3);
    assert_eq!(fx.observer.completions(), 0);

    fx.transport.respond(LIST, json!({"items": []}));
    fx.store.get_photos().await;

    assert_eq!(fx.transport.count(LIST), 4);
    assert_eq!(fx.observer.completions(), 1);
}
