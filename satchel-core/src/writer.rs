//! Per-request writer surface
//!
//! A [`SessionWriter`] binds an entity to the credential sink of one outbound
//! exchange. Mutations forward to the entity and re-issue the credential
//! through the sink; `destroy` issues a revocation instead.

use crate::error::SessionResult;
use crate::session::Session;
use crate::store::CredentialSink;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionWriter {
    session: Arc<Session>,
    sink: Arc<dyn CredentialSink>,
}

impl SessionWriter {
    pub fn new(session: Arc<Session>, sink: Arc<dyn CredentialSink>) -> Self {
        Self { session, sink }
    }

    /// The bound entity, for read operations not mirrored here.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn id(&self) -> String {
        self.session.id()
    }

    pub fn token(&self) -> String {
        self.session.token()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.session.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.session.exists(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.session.keys()
    }

    pub fn get_string(&self, key: &str) -> SessionResult<Option<String>> {
        self.session.get_string(key)
    }

    pub fn get_bool(&self, key: &str) -> SessionResult<Option<bool>> {
        self.session.get_bool(key)
    }

    pub fn get_int(&self, key: &str) -> SessionResult<Option<i32>> {
        self.session.get_int(key)
    }

    pub fn get_int64(&self, key: &str) -> SessionResult<Option<i64>> {
        self.session.get_int64(key)
    }

    pub fn get_float(&self, key: &str) -> SessionResult<Option<f64>> {
        self.session.get_float(key)
    }

    pub fn get_time(&self, key: &str) -> SessionResult<Option<DateTime<Utc>>> {
        self.session.get_time(key)
    }

    pub fn get_bytes(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        self.session.get_bytes(key)
    }

    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        self.session.get_object(key)
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.session.expiry()
    }

    pub fn may_touch(&self) -> bool {
        self.session.may_touch()
    }

    pub async fn put(&self, key: &str, value: impl Into<Value>) -> SessionResult<()> {
        self.session
            .put_with(key, value.into(), Some(self.sink.as_ref()))
            .await
    }

    pub async fn put_object<T: Serialize>(&self, key: &str, value: &T) -> SessionResult<()> {
        let raw = serde_json::to_vec(value)?;
        self.session
            .put_with(key, Value::Object(raw), Some(self.sink.as_ref()))
            .await
    }

    pub async fn pop(&self, key: &str) -> SessionResult<Option<Value>> {
        self.session.pop_with(key, Some(self.sink.as_ref())).await
    }

    pub async fn remove(&self, key: &str) -> SessionResult<()> {
        self.session
            .remove_with(key, Some(self.sink.as_ref()))
            .await
    }

    pub async fn clear(&self) -> SessionResult<()> {
        self.session.clear_with(Some(self.sink.as_ref())).await
    }

    pub async fn touch(&self) -> SessionResult<()> {
        self.session.touch_with(Some(self.sink.as_ref())).await
    }

    pub async fn destroy(&self) -> SessionResult<()> {
        self.session.destroy_with(Some(self.sink.as_ref())).await
    }
}
