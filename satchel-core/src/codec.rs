//! Token generation and the wire envelope
//!
//! A credential token is 256 bits of OS randomness in URL-safe unpadded
//! base64. The envelope is the JSON payload persisted by a store:
//! `{id, data, deadline}` with an absolute nanosecond deadline. The `id`
//! echoes the originating token so a payload decoded after a process restart
//! can still be matched to a live directory entry by identity rather than by
//! current credential.

use crate::error::{SessionError, SessionResult};
use crate::value::Value;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOKEN_BYTES: usize = 32;

/// Mint a fresh credential token.
pub fn generate_token() -> SessionResult<String> {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut raw)
        .map_err(SessionError::TokenGeneration)?;
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    id: String,
    data: serde_json::Map<String, serde_json::Value>,
    deadline: i64,
}

/// Serialize a session's identity, data map and deadline.
pub fn encode(
    id: &str,
    data: &HashMap<String, Value>,
    deadline: DateTime<Utc>,
) -> SessionResult<Vec<u8>> {
    let mut wire = serde_json::Map::with_capacity(data.len());
    for (key, value) in data {
        wire.insert(key.clone(), value.to_json()?);
    }
    let envelope = WireEnvelope {
        id: id.to_string(),
        data: wire,
        deadline: deadline.timestamp_nanos_opt().unwrap_or(i64::MAX),
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Deserialize an envelope back into `(id, data, deadline)`.
///
/// A payload that fails to parse is a hard error; the caller decides whether
/// that aborts a load or merely skips a record during bulk rehydration.
pub fn decode(payload: &[u8]) -> SessionResult<(String, HashMap<String, Value>, DateTime<Utc>)> {
    let envelope: WireEnvelope = serde_json::from_slice(payload)?;
    let mut data = HashMap::with_capacity(envelope.data.len());
    for (key, value) in envelope.data {
        data.insert(key, Value::from_json(value)?);
    }
    let deadline = Utc.timestamp_nanos(envelope.deadline);
    Ok((envelope.id, data, deadline))
}
