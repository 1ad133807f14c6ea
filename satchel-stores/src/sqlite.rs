//! Durable sqlite-backed store
//!
//! One `sessions` table keyed by token, with the payload and a nanosecond
//! expiry. Lookups filter expired rows; an optional background task deletes
//! them for real.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use satchel_core::{SessionError, SessionResult, SessionStore, StoreCapabilities};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed. In-memory databases are
    /// pinned to a single connection so every query sees the same database.
    pub async fn connect(database_url: &str) -> SessionResult<Self> {
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await
                .map_err(SessionError::store)?
        } else {
            let options = SqliteConnectOptions::from_str(database_url)
                .map_err(SessionError::store)?
                .create_if_missing(true);
            SqlitePoolOptions::new()
                .connect_with(options)
                .await
                .map_err(SessionError::store)?
        };
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> SessionResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                expiry INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(SessionError::store)?;
        Ok(())
    }

    /// Delete expired rows periodically until the pool is closed.
    pub fn start_cleanup(&self, interval: Duration) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if pool.is_closed() {
                    break;
                }
                let result = sqlx::query("DELETE FROM sessions WHERE expiry <= ?")
                    .bind(now_nanos())
                    .execute(&pool)
                    .await;
                match result {
                    Ok(done) if done.rows_affected() > 0 => {
                        debug!(removed = done.rows_affected(), "deleted expired session rows");
                    }
                    Ok(_) => {}
                    Err(err) => warn!("expired session cleanup failed: {err}"),
                }
            }
        });
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

#[async_trait]
impl SessionStore for SqliteStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            bulk_reload: true,
            bulk_flush: false,
            client_encoded: false,
        }
    }

    async fn save(&self, token: &str, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, payload, expiry) VALUES (?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET payload = excluded.payload, expiry = excluded.expiry
            "#,
        )
        .bind(token)
        .bind(payload)
        .bind(expiry.timestamp_nanos_opt().unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .map_err(SessionError::store)?;
        Ok(())
    }

    async fn find(&self, token: &str) -> SessionResult<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT payload FROM sessions WHERE token = ? AND expiry > ?")
            .bind(token)
            .bind(now_nanos())
            .fetch_optional(&self.pool)
            .await
            .map_err(SessionError::store)?;
        match row {
            Some(row) => Ok(Some(row.try_get("payload").map_err(SessionError::store)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &str) -> SessionResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(SessionError::store)?;
        Ok(())
    }

    async fn load_all(&self) -> SessionResult<Vec<Vec<u8>>> {
        let rows = sqlx::query("SELECT payload FROM sessions WHERE expiry > ?")
            .bind(now_nanos())
            .fetch_all(&self.pool)
            .await
            .map_err(SessionError::store)?;
        rows.into_iter()
            .map(|row| row.try_get("payload").map_err(SessionError::store))
            .collect()
    }
}
