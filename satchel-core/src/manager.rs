//! Manager and per-process directory
//!
//! The manager owns the configuration, the store, and the directory of live
//! entities. The directory is a per-process optimization cache keyed by each
//! entity's stable identity, which is the token it was minted with, so a
//! payload decoded later still merges onto the resident entity even after
//! credential rotation; a miss always falls back to the store and is never
//! treated as "does not exist".

use crate::codec;
use crate::error::SessionResult;
use crate::finder::Finder;
use crate::handle::Handle;
use crate::options::SessionOptions;
use crate::session::Session;
use crate::store::{RequestScope, SessionStore, StoreCapabilities};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

type Directory = RwLock<HashMap<String, Arc<Session>>>;

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    options: Arc<SessionOptions>,
    directory: Arc<Directory>,
}

impl SessionManager {
    /// Build a manager and start its background expiry sweep. Must be called
    /// from within a tokio runtime.
    pub fn new(store: Arc<dyn SessionStore>, options: SessionOptions) -> Arc<Self> {
        let options = Arc::new(options);
        let directory: Arc<Directory> = Arc::new(RwLock::new(HashMap::new()));
        spawn_sweeper(Arc::downgrade(&directory), sweep_period(&options));
        Arc::new(Self {
            store,
            options,
            directory,
        })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.store.capabilities()
    }

    /// Number of directory-resident entities.
    pub async fn resident(&self) -> usize {
        self.directory.read().await.len()
    }

    /// Create and register a fresh entity.
    pub async fn create_session(&self) -> SessionResult<Arc<Session>> {
        let session = Arc::new(Session::new(self.store.clone(), self.options.clone())?);
        self.register(&session).await;
        debug!(id = %session.id(), "created session");
        Ok(session)
    }

    /// Resolve an inbound credential to a live entity.
    ///
    /// Strict order: request-scope hit, then the credential itself, then
    /// `Store::find`, then envelope decode, then a directory merge by
    /// identity so concurrent requests bearing the same credential converge
    /// on one in-process object. Missing or unknown tokens take the
    /// new-session path; a payload that fails to decode is an error.
    pub async fn load(
        &self,
        scope: &dyn RequestScope,
        token: Option<&str>,
    ) -> SessionResult<Arc<Session>> {
        let name = &self.options.cookie_name;
        if let Some(resolved) = scope.get(name) {
            return Ok(resolved);
        }

        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => {
                let session = self.create_session().await?;
                scope.set(name, session.clone());
                return Ok(session);
            }
        };

        let payload = match self.store.find(token).await? {
            Some(payload) => payload,
            None => {
                let session = self.create_session().await?;
                scope.set(name, session.clone());
                return Ok(session);
            }
        };

        let (id, data, deadline) = codec::decode(&payload)?;

        let resident = self.directory.read().await.get(&id).cloned();
        if let Some(existing) = resident {
            if !existing.expired_at(Utc::now()) {
                scope.set(name, existing.clone());
                return Ok(existing);
            }
        }

        let session = Arc::new(Session::from_envelope(
            self.store.clone(),
            self.options.clone(),
            token.to_string(),
            id,
            data,
            deadline,
        ));
        self.register(&session).await;
        scope.set(name, session.clone());
        Ok(session)
    }

    /// Rehydrate the directory from the store at startup. Records that fail
    /// to decode are logged and skipped so one corrupt record does not block
    /// the rest.
    pub async fn restore(&self) -> SessionResult<usize> {
        let payloads = self.store.load_all().await?;
        let mut restored = 0;
        for payload in payloads {
            let (id, data, deadline) = match codec::decode(&payload) {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!("skipping corrupt session record: {err}");
                    continue;
                }
            };
            let token = id.clone();
            let session = Arc::new(Session::from_envelope(
                self.store.clone(),
                self.options.clone(),
                token,
                id,
                data,
                deadline,
            ));
            self.register(&session).await;
            restored += 1;
        }
        debug!(restored, "restored directory from store");
        Ok(restored)
    }

    /// Flush the store to durable storage before shutdown.
    pub async fn flush(&self) -> SessionResult<()> {
        self.store.dump().await
    }

    /// One expiry pass: prune exactly the directory entries whose effective
    /// expiry has passed. The store expires its own records independently;
    /// this never calls `Store::delete`.
    pub async fn sweep_now(&self) -> usize {
        sweep(&self.directory).await
    }

    /// Directory-snapshot query.
    pub async fn find_sessions(&self, finder: &Finder) -> Vec<Arc<Session>> {
        let snapshot: Vec<Arc<Session>> = self.directory.read().await.values().cloned().collect();
        snapshot
            .into_iter()
            .filter(|session| finder(session))
            .collect()
    }

    /// Apply a handle to every match in the current directory snapshot.
    /// Returns the number of entities handled.
    pub async fn for_each(&self, finder: &Finder, handle: &Handle) -> usize {
        let snapshot: Vec<Arc<Session>> = self.directory.read().await.values().cloned().collect();
        let mut handled = 0;
        for session in snapshot {
            if finder(&session) {
                handle(&session);
                handled += 1;
            }
        }
        handled
    }

    async fn register(&self, session: &Arc<Session>) {
        // read the identity before taking the directory guard; entity locks
        // and the directory lock are never held together
        let id = session.id();
        self.directory.write().await.insert(id, session.clone());
    }
}

/// Sweep period: 15 minutes, or half the idle timeout rounded up to whole
/// minutes when one is configured.
fn sweep_period(options: &SessionOptions) -> Duration {
    match options.idle_timeout {
        Some(idle) => {
            let minutes = (idle.as_secs() + 59) / 60;
            Duration::from_secs(60 * minutes.div_ceil(2).max(1))
        }
        None => Duration::from_secs(15 * 60),
    }
}

async fn sweep(directory: &Directory) -> usize {
    let now = Utc::now();
    // judge expiry on a snapshot so entity locks are never taken under the
    // directory guard
    let snapshot: Vec<(String, Arc<Session>)> = directory
        .read()
        .await
        .iter()
        .map(|(id, session)| (id.clone(), session.clone()))
        .collect();
    let dead: Vec<String> = snapshot
        .into_iter()
        .filter(|(_, session)| session.expired_at(now))
        .map(|(id, _)| id)
        .collect();
    if dead.is_empty() {
        return 0;
    }
    let mut directory = directory.write().await;
    let mut removed = 0;
    for id in dead {
        if directory.remove(&id).is_some() {
            removed += 1;
        }
    }
    debug!(removed, "expiry sweep pruned directory entries");
    removed
}

/// Self-rescheduling one-shot sleeps rather than a fixed-rate ticker, so
/// passes never overlap. Stops once the directory is dropped.
fn spawn_sweeper(directory: Weak<Directory>, period: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;
            let Some(directory) = directory.upgrade() else {
                break;
            };
            sweep(&directory).await;
        }
    });
}
