use chrono::{Duration as ChronoDuration, Utc};
use satchel_core::SessionStore;
use satchel_stores::MemoryStore;
use std::time::Duration;

#[tokio::test]
async fn save_find_delete_round_trip() {
    let store = MemoryStore::new();
    let expiry = Utc::now() + ChronoDuration::hours(1);

    store.save("tok", b"payload", expiry).await.unwrap();
    assert_eq!(store.find("tok").await.unwrap(), Some(b"payload".to_vec()));

    store.delete("tok").await.unwrap();
    assert_eq!(store.find("tok").await.unwrap(), None);
}

#[tokio::test]
async fn save_upserts_content_and_expiry() {
    let store = MemoryStore::new();
    let expiry = Utc::now() + ChronoDuration::hours(1);

    store.save("tok", b"first", expiry).await.unwrap();
    store.save("tok", b"second", expiry).await.unwrap();
    assert_eq!(store.find("tok").await.unwrap(), Some(b"second".to_vec()));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn expired_record_reads_as_not_found() {
    let store = MemoryStore::new();
    let past = Utc::now() - ChronoDuration::seconds(1);

    store.save("tok", b"payload", past).await.unwrap();
    assert_eq!(store.find("tok").await.unwrap(), None);
}

#[tokio::test]
async fn bulk_operations_require_a_dump_file() {
    let store = MemoryStore::new();
    let caps = store.capabilities();
    assert!(!caps.bulk_reload);
    assert!(!caps.bulk_flush);
    assert!(store.load_all().await.is_err());
    assert!(store.dump().await.is_err());
}

#[tokio::test]
async fn snapshot_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let expiry = Utc::now() + ChronoDuration::hours(1);

    let store = MemoryStore::with_dump_file(&path);
    store.save("a", b"one", expiry).await.unwrap();
    store.save("b", b"two", expiry).await.unwrap();
    store.dump().await.unwrap();

    let reborn = MemoryStore::with_dump_file(&path);
    let mut payloads = reborn.load_all().await.unwrap();
    payloads.sort();
    assert_eq!(payloads, vec![b"one".to_vec(), b"two".to_vec()]);
    assert_eq!(reborn.find("a").await.unwrap(), Some(b"one".to_vec()));
}

#[tokio::test]
async fn missing_snapshot_is_an_empty_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::with_dump_file(dir.path().join("absent.json"));
    assert!(store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_excludes_expired_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    let store = MemoryStore::with_dump_file(&path);
    store
        .save("live", b"x", Utc::now() + ChronoDuration::hours(1))
        .await
        .unwrap();
    store
        .save("dead", b"y", Utc::now() - ChronoDuration::seconds(1))
        .await
        .unwrap();
    store.dump().await.unwrap();

    let reborn = MemoryStore::with_dump_file(&path);
    assert_eq!(reborn.load_all().await.unwrap(), vec![b"x".to_vec()]);
}

#[tokio::test]
async fn cleanup_task_prunes_expired_records() {
    let store = MemoryStore::new();
    store
        .save("dead", b"x", Utc::now() - ChronoDuration::seconds(1))
        .await
        .unwrap();
    store
        .save("live", b"y", Utc::now() + ChronoDuration::hours(1))
        .await
        .unwrap();

    store.start_cleanup(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.len(), 1);
    assert_eq!(store.find("live").await.unwrap(), Some(b"y".to_vec()));
}
