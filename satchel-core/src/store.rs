//! Persistence contract and transport collaborator traits
//!
//! A store is the source of truth for session records. Optional operations
//! are advertised through an explicit capability descriptor rather than
//! probed by type introspection at call time.

use crate::error::{SessionError, SessionResult};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Optional abilities a store advertises at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreCapabilities {
    /// `load_all` can rehydrate the directory at startup
    pub bulk_reload: bool,
    /// `dump` can flush current contents to durable storage before shutdown
    pub bulk_flush: bool,
    /// `make_token` encodes the payload into the credential itself; the
    /// manager calls it in place of both random token generation and `save`
    pub client_encoded: bool,
}

/// Persistence backend for session records.
///
/// Cancellation and timeouts are the backend's own business; the core adds
/// no additional timeout layer.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }

    /// Upsert a record, updating both content and expiry.
    async fn save(&self, token: &str, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<()>;

    /// Look up a record. `Ok(None)` is the defined new-session path, never an
    /// error.
    async fn find(&self, token: &str) -> SessionResult<Option<Vec<u8>>>;

    async fn delete(&self, token: &str) -> SessionResult<()>;

    /// All live payloads, for directory rehydration. Requires `bulk_reload`.
    async fn load_all(&self) -> SessionResult<Vec<Vec<u8>>> {
        Err(SessionError::Unsupported("bulk reload"))
    }

    /// Flush current contents to durable storage. Requires `bulk_flush`.
    async fn dump(&self) -> SessionResult<()> {
        Err(SessionError::Unsupported("bulk flush"))
    }

    /// Encode the payload into a self-carrying token. Requires
    /// `client_encoded`.
    async fn make_token(&self, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<String> {
        let _ = (payload, expiry);
        Err(SessionError::Unsupported("client-encoded tokens"))
    }
}

/// An issued transport credential.
///
/// `expires` carries the absolute expiry rounded up to the next whole second
/// together with a remaining-seconds count, or `None` for a client-session
/// credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub expires: Option<(DateTime<Utc>, i64)>,
}

impl Credential {
    /// True for a credential issued to revoke a previous one.
    pub fn is_revocation(&self) -> bool {
        self.value.is_empty()
    }
}

/// Outbound credential channel. Applying a credential under a name already
/// applied in the same exchange replaces the earlier one.
pub trait CredentialSink: Send + Sync {
    fn apply(&self, credential: Credential);
}

/// Cache of entities already resolved within one request's lifetime, keyed by
/// credential name.
pub trait RequestScope: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<Session>>;
    fn set(&self, name: &str, session: Arc<Session>);
}

/// In-memory [`RequestScope`] for non-HTTP callers and tests.
#[derive(Default)]
pub struct LocalScope {
    entries: Mutex<HashMap<String, Arc<Session>>>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestScope for LocalScope {
    fn get(&self, name: &str) -> Option<Arc<Session>> {
        self.entries.lock().get(name).cloned()
    }

    fn set(&self, name: &str, session: Arc<Session>) {
        self.entries.lock().insert(name.to_string(), session);
    }
}
