//! Volatile in-memory store
//!
//! Records live in a map guarded by a read/write lock; expiry is checked on
//! lookup and an optional background task prunes dead records. When a dump
//! file is configured the store can flush a JSON snapshot before shutdown and
//! reload it on the next start, which enables the bulk capabilities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use satchel_core::{SessionError, SessionResult, SessionStore, StoreCapabilities};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Serialize, Deserialize)]
struct Record {
    payload: Vec<u8>,
    expiry_nanos: i64,
}

impl Record {
    fn live_at(&self, now_nanos: i64) -> bool {
        self.expiry_nanos > now_nanos
    }
}

pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
    dump_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            dump_path: None,
        }
    }

    /// Store whose contents survive restarts via a JSON snapshot file.
    pub fn with_dump_file(path: impl Into<PathBuf>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            dump_path: Some(path.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Prune expired records periodically until the store is dropped.
    pub fn start_cleanup(&self, interval: Duration) {
        let records: Weak<RwLock<HashMap<String, Record>>> = Arc::downgrade(&self.records);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(records) = records.upgrade() else {
                    break;
                };
                let now = now_nanos();
                let mut records = records.write();
                let before = records.len();
                records.retain(|_, record| record.live_at(now));
                let removed = before - records.len();
                if removed > 0 {
                    debug!(removed, "pruned expired session records");
                }
            }
        });
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

#[async_trait]
impl SessionStore for MemoryStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            bulk_reload: self.dump_path.is_some(),
            bulk_flush: self.dump_path.is_some(),
            client_encoded: false,
        }
    }

    async fn save(&self, token: &str, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<()> {
        let record = Record {
            payload: payload.to_vec(),
            expiry_nanos: expiry.timestamp_nanos_opt().unwrap_or(i64::MAX),
        };
        self.records.write().insert(token.to_string(), record);
        Ok(())
    }

    async fn find(&self, token: &str) -> SessionResult<Option<Vec<u8>>> {
        let records = self.records.read();
        Ok(records
            .get(token)
            .filter(|record| record.live_at(now_nanos()))
            .map(|record| record.payload.clone()))
    }

    async fn delete(&self, token: &str) -> SessionResult<()> {
        self.records.write().remove(token);
        Ok(())
    }

    /// Merge the snapshot file (if any) into the map, then return every live
    /// payload. A missing file is an empty reload, not an error.
    async fn load_all(&self) -> SessionResult<Vec<Vec<u8>>> {
        let Some(path) = &self.dump_path else {
            return Err(SessionError::Unsupported("bulk reload"));
        };
        match std::fs::read(path) {
            Ok(raw) => {
                let snapshot: HashMap<String, Record> = serde_json::from_slice(&raw)?;
                let mut records = self.records.write();
                for (token, record) in snapshot {
                    records.entry(token).or_insert(record);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("session snapshot {} not found, starting empty", path.display());
            }
            Err(err) => return Err(SessionError::store(err)),
        }
        let now = now_nanos();
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|record| record.live_at(now))
            .map(|record| record.payload.clone())
            .collect())
    }

    /// Write a snapshot of the live records to the dump file.
    async fn dump(&self) -> SessionResult<()> {
        let Some(path) = &self.dump_path else {
            return Err(SessionError::Unsupported("bulk flush"));
        };
        let snapshot: HashMap<String, Record> = {
            let now = now_nanos();
            self.records
                .read()
                .iter()
                .filter(|(_, record)| record.live_at(now))
                .map(|(token, record)| (token.clone(), record.clone()))
                .collect()
        };
        let raw = serde_json::to_vec_pretty(&snapshot)?;
        std::fs::write(path, raw).map_err(SessionError::store)?;
        debug!(records = snapshot.len(), "dumped session snapshot");
        Ok(())
    }
}
