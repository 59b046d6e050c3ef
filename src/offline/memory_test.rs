use super::*;
use serde_json::json;

#[tokio::test]
async fn resave_moves_record_to_the_end() {
    let store = MemoryKeyValueStore::new();
    store.save("a", &json!({"key": "a"})).await.unwrap();
    store.save("b", &json!({"key": "b"})).await.unwrap();
    store.save("a", &json!({"key": "a", "title": "again"})).await.unwrap();

    assert_eq!(store.keys(), vec!["b", "a"]);
    assert_eq!(store.get("a").await.unwrap().unwrap()["title"], "again");
    assert_eq!(store.all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn remove_missing_key_is_ok() {
    let store = MemoryKeyValueStore::new();
    store.remove("missing").await.unwrap();
    assert!(store.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_filesystem_moves_files() {
    let fs = MemoryFilesystem::new();
    fs.write("hash-1", b"png", "image/png").await.unwrap();

    let entry = fs.mv("hash-1", ".", "server123").await.unwrap();
    assert_eq!(entry.uri, "memory:///server123");
    assert!(!fs.contains("hash-1"));
    assert_eq!(fs.mime_type("server123").as_deref(), Some("image/png"));
    assert!(matches!(fs.mv("hash-1", ".", "x").await, Err(StoreError::NotFound(_))));
}
