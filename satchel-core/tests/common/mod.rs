#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use satchel_core::{Credential, CredentialSink, SessionResult, SessionStore};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Minimal backend for exercising the core: a map plus a switch to make
/// saves fail.
#[derive(Default)]
pub struct TestStore {
    records: Mutex<HashMap<String, (Vec<u8>, DateTime<Utc>)>>,
    fail_saves: AtomicBool,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, token: &str, payload: &[u8], expiry: DateTime<Utc>) {
        self.records
            .lock()
            .insert(token.to_string(), (payload.to_vec(), expiry));
    }

    pub fn contains(&self, token: &str) -> bool {
        self.records.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn payload_of(&self, token: &str) -> Option<Vec<u8>> {
        self.records.lock().get(token).map(|(p, _)| p.clone())
    }

    pub fn expiry_of(&self, token: &str) -> Option<DateTime<Utc>> {
        self.records.lock().get(token).map(|(_, e)| *e)
    }
}

#[async_trait]
impl SessionStore for TestStore {
    async fn save(&self, token: &str, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(satchel_core::SessionError::store(io::Error::new(
                io::ErrorKind::Other,
                "saves disabled",
            )));
        }
        self.records
            .lock()
            .insert(token.to_string(), (payload.to_vec(), expiry));
        Ok(())
    }

    async fn find(&self, token: &str) -> SessionResult<Option<Vec<u8>>> {
        Ok(self.records.lock().get(token).map(|(p, _)| p.clone()))
    }

    async fn delete(&self, token: &str) -> SessionResult<()> {
        self.records.lock().remove(token);
        Ok(())
    }
}

/// Records every applied credential, newest last.
#[derive(Default)]
pub struct TestSink {
    applied: Mutex<Vec<Credential>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<Credential> {
        self.applied.lock().clone()
    }

    pub fn last(&self) -> Option<Credential> {
        self.applied.lock().last().cloned()
    }
}

impl CredentialSink for TestSink {
    fn apply(&self, credential: Credential) {
        self.applied.lock().push(credential);
    }
}
