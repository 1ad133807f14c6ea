//! Client-encoded store
//!
//! No server-side record exists: `make_token` packs the expiry and payload
//! into the credential itself and authenticates it with HMAC-SHA256.
//! Tampered, malformed or expired tokens read as not-found, which is the
//! defined new-session path, never an error.
//!
//! Token layout: `b64(expiry_be8 || payload) "." b64(tag)` with URL-safe
//! unpadded base64.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use satchel_core::{SessionError, SessionResult, SessionStore, StoreCapabilities};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub struct ClientStore {
    key: Vec<u8>,
}

impl ClientStore {
    /// The key must stay stable across restarts or every outstanding token
    /// reads as not-found.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn mac(&self) -> SessionResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|err| SessionError::codec(err.to_string()))
    }
}

#[async_trait]
impl SessionStore for ClientStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            bulk_reload: false,
            bulk_flush: false,
            client_encoded: true,
        }
    }

    // The token is the record; nothing to persist.
    async fn save(&self, _token: &str, _payload: &[u8], _expiry: DateTime<Utc>) -> SessionResult<()> {
        Ok(())
    }

    async fn find(&self, token: &str) -> SessionResult<Option<Vec<u8>>> {
        let Some((body, tag)) = token.split_once('.') else {
            return Ok(None);
        };
        let Ok(message) = URL_SAFE_NO_PAD.decode(body) else {
            return Ok(None);
        };
        let Ok(tag) = URL_SAFE_NO_PAD.decode(tag) else {
            return Ok(None);
        };
        let mut mac = self.mac()?;
        mac.update(&message);
        if mac.verify_slice(&tag).is_err() {
            return Ok(None);
        }
        if message.len() < 8 {
            return Ok(None);
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&message[..8]);
        let expiry_nanos = i64::from_be_bytes(raw);
        if expiry_nanos <= Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX) {
            return Ok(None);
        }
        Ok(Some(message[8..].to_vec()))
    }

    async fn delete(&self, _token: &str) -> SessionResult<()> {
        Ok(())
    }

    async fn make_token(&self, payload: &[u8], expiry: DateTime<Utc>) -> SessionResult<String> {
        let expiry_nanos = expiry.timestamp_nanos_opt().unwrap_or(i64::MAX);
        let mut message = Vec::with_capacity(8 + payload.len());
        message.extend_from_slice(&expiry_nanos.to_be_bytes());
        message.extend_from_slice(payload);
        let mut mac = self.mac()?;
        mac.update(&message);
        let tag = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&message),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }
}
