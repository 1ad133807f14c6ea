//! The per-client session entity
//!
//! A session holds a keyed map of values, an absolute deadline fixed at
//! creation, and idle bookkeeping. Every mutation is write-through: the full
//! envelope is re-serialized and persisted immediately, and the credential is
//! re-issued when a sink is supplied.
//!
//! Locking discipline: the state mutex guards in-memory data only and is
//! never held across a store call. Mutation and persistence are sequenced as
//! lock, mutate, unlock, persist, so one entity's store latency never blocks
//! readers of a different entity. Two concurrent writers to the same entity
//! from different processes can still race at the store (last write wins);
//! the directory is a per-process cache, not a consistency mechanism.

use crate::codec;
use crate::error::{SessionError, SessionResult};
use crate::options::SessionOptions;
use crate::store::{Credential, CredentialSink, SessionStore};
use crate::value::Value;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

struct State {
    id: String,
    token: String,
    data: HashMap<String, Value>,
    last_access: Option<DateTime<Utc>>,
}

pub struct Session {
    deadline: DateTime<Utc>,
    options: Arc<SessionOptions>,
    store: Arc<dyn SessionStore>,
    state: Mutex<State>,
}

impl Session {
    /// Fresh entity with a newly minted token. The deadline is fixed here
    /// and never slides.
    pub(crate) fn new(
        store: Arc<dyn SessionStore>,
        options: Arc<SessionOptions>,
    ) -> SessionResult<Self> {
        let token = codec::generate_token()?;
        Ok(Self {
            deadline: Utc::now() + options.lifetime_chrono(),
            options,
            store,
            state: Mutex::new(State {
                id: token.clone(),
                token,
                data: HashMap::new(),
                last_access: None,
            }),
        })
    }

    /// Entity reconstructed from a decoded store payload.
    pub(crate) fn from_envelope(
        store: Arc<dyn SessionStore>,
        options: Arc<SessionOptions>,
        token: String,
        id: String,
        data: HashMap<String, Value>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            deadline,
            options,
            store,
            state: Mutex::new(State {
                id,
                token,
                data,
                last_access: None,
            }),
        }
    }

    /// Stable identity; differs from `token` after credential rotation.
    pub fn id(&self) -> String {
        self.state.lock().id.clone()
    }

    /// Current transport credential.
    pub fn token(&self) -> String {
        self.state.lock().token.clone()
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn last_access(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_access
    }

    /// True once `destroy` has cleared the identity. Reads on a destroyed
    /// session behave as an empty session; mutations fail with
    /// [`SessionError::Destroyed`].
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().token.is_empty()
    }

    // Read operations

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().data.get(key).cloned()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.state.lock().data.contains_key(key)
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().data.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get_string(&self, key: &str) -> SessionResult<Option<String>> {
        self.get(key).map(|v| v.as_string()).transpose()
    }

    pub fn get_bool(&self, key: &str) -> SessionResult<Option<bool>> {
        self.get(key).map(|v| v.as_bool()).transpose()
    }

    pub fn get_int(&self, key: &str) -> SessionResult<Option<i32>> {
        self.get(key).map(|v| v.as_int()).transpose()
    }

    pub fn get_int64(&self, key: &str) -> SessionResult<Option<i64>> {
        self.get(key).map(|v| v.as_int64()).transpose()
    }

    pub fn get_float(&self, key: &str) -> SessionResult<Option<f64>> {
        self.get(key).map(|v| v.as_float()).transpose()
    }

    pub fn get_time(&self, key: &str) -> SessionResult<Option<DateTime<Utc>>> {
        self.get(key).map(|v| v.as_time()).transpose()
    }

    pub fn get_bytes(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        self.get(key).map(|v| v.as_bytes()).transpose()
    }

    /// Deserialize an opaque object stored with [`Session::put_object`].
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        match self.get(key) {
            Some(value) => {
                let raw = value.as_object_bytes()?;
                Ok(Some(serde_json::from_slice(&raw)?))
            }
            None => Ok(None),
        }
    }

    // Write-through operations

    pub async fn put(&self, key: &str, value: impl Into<Value>) -> SessionResult<()> {
        self.put_with(key, value.into(), None).await
    }

    pub async fn put_object<T: Serialize>(&self, key: &str, value: &T) -> SessionResult<()> {
        let raw = serde_json::to_vec(value)?;
        self.put_with(key, Value::Object(raw), None).await
    }

    pub async fn pop(&self, key: &str) -> SessionResult<Option<Value>> {
        self.pop_with(key, None).await
    }

    pub async fn pop_string(&self, key: &str) -> SessionResult<Option<String>> {
        self.pop(key).await?.map(|v| v.as_string()).transpose()
    }

    pub async fn pop_bool(&self, key: &str) -> SessionResult<Option<bool>> {
        self.pop(key).await?.map(|v| v.as_bool()).transpose()
    }

    pub async fn pop_int(&self, key: &str) -> SessionResult<Option<i32>> {
        self.pop(key).await?.map(|v| v.as_int()).transpose()
    }

    pub async fn pop_int64(&self, key: &str) -> SessionResult<Option<i64>> {
        self.pop(key).await?.map(|v| v.as_int64()).transpose()
    }

    pub async fn pop_float(&self, key: &str) -> SessionResult<Option<f64>> {
        self.pop(key).await?.map(|v| v.as_float()).transpose()
    }

    pub async fn pop_time(&self, key: &str) -> SessionResult<Option<DateTime<Utc>>> {
        self.pop(key).await?.map(|v| v.as_time()).transpose()
    }

    pub async fn pop_bytes(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        self.pop(key).await?.map(|v| v.as_bytes()).transpose()
    }

    pub async fn pop_object<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        match self.pop(key).await? {
            Some(value) => {
                let raw = value.as_object_bytes()?;
                Ok(Some(serde_json::from_slice(&raw)?))
            }
            None => Ok(None),
        }
    }

    pub async fn remove(&self, key: &str) -> SessionResult<()> {
        self.remove_with(key, None).await
    }

    pub async fn clear(&self) -> SessionResult<()> {
        self.clear_with(None).await
    }

    /// Write-through with no data change, sliding the idle-derived expiry and
    /// refreshing the issued credential.
    pub async fn touch(&self) -> SessionResult<()> {
        self.touch_with(None).await
    }

    /// Delete the store record and clear data and identity. Idempotent.
    pub async fn destroy(&self) -> SessionResult<()> {
        self.destroy_with(None).await
    }

    pub(crate) async fn put_with(
        &self,
        key: &str,
        value: Value,
        sink: Option<&dyn CredentialSink>,
    ) -> SessionResult<()> {
        {
            let mut state = self.state.lock();
            if state.token.is_empty() {
                return Err(SessionError::Destroyed);
            }
            state.data.insert(key.to_string(), value);
        }
        self.write_through(sink).await
    }

    pub(crate) async fn pop_with(
        &self,
        key: &str,
        sink: Option<&dyn CredentialSink>,
    ) -> SessionResult<Option<Value>> {
        let removed = {
            let mut state = self.state.lock();
            if state.token.is_empty() {
                return Err(SessionError::Destroyed);
            }
            state.data.remove(key)
        };
        if removed.is_some() {
            self.write_through(sink).await?;
        }
        Ok(removed)
    }

    pub(crate) async fn remove_with(
        &self,
        key: &str,
        sink: Option<&dyn CredentialSink>,
    ) -> SessionResult<()> {
        self.pop_with(key, sink).await?;
        Ok(())
    }

    pub(crate) async fn clear_with(&self, sink: Option<&dyn CredentialSink>) -> SessionResult<()> {
        {
            let mut state = self.state.lock();
            if state.token.is_empty() {
                return Err(SessionError::Destroyed);
            }
            state.data.clear();
        }
        self.write_through(sink).await
    }

    pub(crate) async fn touch_with(&self, sink: Option<&dyn CredentialSink>) -> SessionResult<()> {
        self.write_through(sink).await
    }

    pub(crate) async fn destroy_with(
        &self,
        sink: Option<&dyn CredentialSink>,
    ) -> SessionResult<()> {
        let token = {
            let state = self.state.lock();
            if state.token.is_empty() {
                return Ok(());
            }
            state.token.clone()
        };
        self.store.delete(&token).await?;
        {
            let mut state = self.state.lock();
            state.token.clear();
            state.id.clear();
            state.data.clear();
            state.last_access = None;
        }
        if let Some(sink) = sink {
            sink.apply(self.revoked_credential());
        }
        Ok(())
    }

    /// In-memory insertion with no write-through, for directory-side effects.
    /// No-op on a destroyed session.
    pub fn put_local(&self, key: &str, value: impl Into<Value>) {
        let mut state = self.state.lock();
        if state.token.is_empty() {
            return;
        }
        state.data.insert(key.to_string(), value.into());
    }

    async fn write_through(&self, sink: Option<&dyn CredentialSink>) -> SessionResult<()> {
        let now = Utc::now();
        let (token, payload) = {
            let mut state = self.state.lock();
            if state.token.is_empty() {
                return Err(SessionError::Destroyed);
            }
            state.last_access = Some(now);
            let payload = codec::encode(&state.id, &state.data, self.deadline)?;
            (state.token.clone(), payload)
        };
        let expiry = self.expiry_from(now);
        if self.store.capabilities().client_encoded {
            let fresh = self.store.make_token(&payload, expiry).await?;
            self.state.lock().token = fresh;
        } else {
            self.store.save(&token, &payload, expiry).await?;
        }
        if let Some(sink) = sink {
            sink.apply(self.issued_credential(expiry));
        }
        Ok(())
    }

    // Expiry arithmetic

    /// Effective expiry of the record and credential:
    /// min(deadline, now + idle) when an idle timeout is configured.
    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry_from(Utc::now())
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.options.idle_chrono() {
            Some(idle) => std::cmp::min(self.deadline, now + idle),
            None => self.deadline,
        }
    }

    /// Whether the entity is dead as of `at`. The idle clock runs from the
    /// recorded last access; an entity never written only dies at its
    /// deadline.
    pub fn expired_at(&self, at: DateTime<Utc>) -> bool {
        if at >= self.deadline {
            return true;
        }
        let Some(idle) = self.options.idle_chrono() else {
            return false;
        };
        match self.state.lock().last_access {
            Some(seen) => at >= seen + idle,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// Advisory: is a refresh worth issuing under the idle-timeout policy?
    /// True when an idle timeout is configured and either no access has been
    /// recorded yet or the touch interval has elapsed since the last one.
    pub fn may_touch(&self) -> bool {
        if self.options.idle_timeout.is_none() {
            return false;
        }
        match (self.state.lock().last_access, self.options.touch_chrono()) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(seen), Some(interval)) => Utc::now() >= seen + interval,
        }
    }

    // Credential issuance

    fn issued_credential(&self, expiry: DateTime<Utc>) -> Credential {
        let expires = if self.options.persist {
            // round up to the next whole second for the transport
            let rounded = DateTime::<Utc>::UNIX_EPOCH
                + chrono::Duration::seconds(expiry.timestamp().saturating_add(1));
            let remaining = (rounded - Utc::now()).num_seconds().max(0);
            Some((rounded, remaining))
        } else {
            None
        };
        Credential {
            name: self.options.cookie_name.clone(),
            value: self.token(),
            path: self.options.cookie_path.clone(),
            domain: self.options.cookie_domain.clone(),
            secure: self.options.secure,
            http_only: self.options.http_only,
            expires,
        }
    }

    fn revoked_credential(&self) -> Credential {
        Credential {
            name: self.options.cookie_name.clone(),
            value: String::new(),
            path: self.options.cookie_path.clone(),
            domain: self.options.cookie_domain.clone(),
            secure: self.options.secure,
            http_only: self.options.http_only,
            expires: Some((DateTime::<Utc>::UNIX_EPOCH, 0)),
        }
    }
}
