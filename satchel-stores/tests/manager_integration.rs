//! The manager driving real store backends.

use chrono::{Duration as ChronoDuration, Utc};
use satchel_core::{LocalScope, SessionManager, SessionOptions, SessionStore};
use satchel_stores::{ClientStore, MemoryStore};
use std::sync::Arc;

#[tokio::test]
async fn memory_backed_sessions_survive_directory_eviction() {
    let store = Arc::new(MemoryStore::new());
    let manager = SessionManager::new(store, SessionOptions::default());

    let scope = LocalScope::new();
    let session = manager.load(&scope, None).await.unwrap();
    session.put("user", "alice").await.unwrap();
    let token = session.token();

    let later = LocalScope::new();
    let resolved = manager.load(&later, Some(&token)).await.unwrap();
    assert_eq!(resolved.get_string("user").unwrap(), Some("alice".into()));
}

#[tokio::test]
async fn restore_rehydrates_and_skips_corrupt_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    {
        let store = Arc::new(MemoryStore::with_dump_file(&path));
        let manager = SessionManager::new(store, SessionOptions::default());
        let a = manager.create_session().await.unwrap();
        a.put("n", 1i32).await.unwrap();
        let b = manager.create_session().await.unwrap();
        b.put("n", 2i32).await.unwrap();
        manager.flush().await.unwrap();
    }

    let store = Arc::new(MemoryStore::with_dump_file(&path));
    // a record no envelope decode will accept
    store
        .save("junk", b"junk", Utc::now() + ChronoDuration::hours(1))
        .await
        .unwrap();
    let manager = SessionManager::new(store, SessionOptions::default());

    assert_eq!(manager.restore().await.unwrap(), 2);
    assert_eq!(manager.resident().await, 2);
}

#[tokio::test]
async fn client_encoded_write_rotates_the_token() {
    let store = Arc::new(ClientStore::new(b"an adequately long signing key!!".to_vec()));
    let manager = SessionManager::new(store, SessionOptions::default());

    let scope = LocalScope::new();
    let session = manager.load(&scope, None).await.unwrap();
    let initial = session.token();
    session.put("user", "alice").await.unwrap();

    let rotated = session.token();
    assert_ne!(initial, rotated);
    // identity is stable across rotation
    assert_eq!(session.id(), initial);
}

#[tokio::test]
async fn rotated_token_resolves_to_the_same_entity() {
    let store = Arc::new(ClientStore::new(b"an adequately long signing key!!".to_vec()));
    let manager = SessionManager::new(store, SessionOptions::default());

    let scope = LocalScope::new();
    let session = manager.load(&scope, None).await.unwrap();
    session.put("user", "alice").await.unwrap();
    let token = session.token();

    // a later request carrying the rotated token converges on the resident
    // entity by identity
    let later = LocalScope::new();
    let resolved = manager.load(&later, Some(&token)).await.unwrap();
    assert!(Arc::ptr_eq(&session, &resolved));
    assert_eq!(resolved.get_string("user").unwrap(), Some("alice".into()));
}

#[tokio::test]
async fn reconstructed_entities_converge_by_identity_across_rotations() {
    let key = b"an adequately long signing key!!".to_vec();
    let store = Arc::new(ClientStore::new(key.clone()));
    let manager = SessionManager::new(store, SessionOptions::default());

    let scope = LocalScope::new();
    let session = manager.load(&scope, None).await.unwrap();
    session.put("user", "alice").await.unwrap();
    let token = session.token();

    // a restarted process sees the rotated token with no resident entity
    let restarted = SessionManager::new(
        Arc::new(ClientStore::new(key)),
        SessionOptions::default(),
    );
    let first = restarted
        .load(&LocalScope::new(), Some(&token))
        .await
        .unwrap();
    first.put("visits", 1i32).await.unwrap();
    let rotated = first.token();
    assert_ne!(rotated, token);

    // the next rotation still merges onto the resident entity by identity
    // instead of minting an independent copy
    let second = restarted
        .load(&LocalScope::new(), Some(&rotated))
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(restarted.resident().await, 1);
}

#[tokio::test]
async fn stale_client_token_starts_a_new_session() {
    let store = Arc::new(ClientStore::new(b"an adequately long signing key!!".to_vec()));
    let manager = SessionManager::new(store, SessionOptions::default());

    let scope = LocalScope::new();
    let session = manager
        .load(&scope, Some("tampered-or-expired"))
        .await
        .unwrap();
    assert!(session.keys().is_empty());
    assert_ne!(session.token(), "tampered-or-expired");
}
