use super::*;
use serde_json::json;

async fn pool() -> SqlitePool {
    crate::db::init_pool("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn save_get_remove() {
    let store = SqliteKeyValueStore::new(pool().await, "PicturesqueApp.db");

    store.save("hash-1", &json!({"key": "hash-1", "localOnly": true})).await.unwrap();
    assert_eq!(store.get("hash-1").await.unwrap().unwrap()["localOnly"], true);

    store.remove("hash-1").await.unwrap();
    assert!(store.get("hash-1").await.unwrap().is_none());
    store.remove("hash-1").await.unwrap();
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let pool = pool().await;
    let photos = SqliteKeyValueStore::new(pool.clone(), "PicturesqueApp.db");
    let cursor = SqliteKeyValueStore::new(pool, "PicturesqueApp.lastUpdated");

    photos.save("lastUpdated", &json!({"key": "photo"})).await.unwrap();
    cursor.save("lastUpdated", &json!({"lastUpdated": "2013-06-01T10:00:00"})).await.unwrap();

    assert_eq!(photos.all().await.unwrap(), vec![json!({"key": "photo"})]);
    assert_eq!(cursor.get("lastUpdated").await.unwrap().unwrap()["lastUpdated"], "2013-06-01T10:00:00");
}

#[tokio::test]
async fn all_returns_last_saved_order() {
    let store = SqliteKeyValueStore::new(pool().await, "PicturesqueApp.db");
    store.save("a", &json!({"key": "a"})).await.unwrap();
    store.save("b", &json!({"key": "b"})).await.unwrap();
    store.save("a", &json!({"key": "a", "v": 2})).await.unwrap();

    let keys: Vec<Value> = store.all().await.unwrap().into_iter().map(|r| r["key"].clone()).collect();
    assert_eq!(keys, vec![json!("b"), json!("a")]);
}
