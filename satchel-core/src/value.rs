//! Dynamically-typed session values
//!
//! Session data is a map of string keys to tagged values. Retrieval is
//! runtime-checked: every typed accessor performs a projection that fails
//! with `TypeMismatch` when the stored kind disagrees.

use crate::error::{SessionError, SessionResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};

/// A single session value.
///
/// `Number` is the decimal-preserving intermediate produced when a payload is
/// decoded from the wire: JSON numbers stay in that form until a typed
/// accessor resolves them into an integer or floating value, so the
/// integer/float distinction survives a round-trip without precision loss.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Bytes(Vec<u8>),
    /// An opaque serialized object, stored as raw bytes
    Object(Vec<u8>),
    /// Decimal-preserving numeric form decoded from the wire
    Number(serde_json::Number),
}

impl Value {
    /// Name of the dynamic kind, used in mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Int64(_) => "int64",
            Value::Float(_) => "float",
            Value::Time(_) => "time",
            Value::Bytes(_) => "bytes",
            Value::Object(_) => "object",
            Value::Number(_) => "number",
        }
    }

    fn mismatch(&self, expected: &'static str) -> SessionError {
        SessionError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_string(&self) -> SessionResult<String> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_bool(&self) -> SessionResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_int(&self) -> SessionResult<i32> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Number(n) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| self.mismatch("int")),
            other => Err(other.mismatch("int")),
        }
    }

    pub fn as_int64(&self) -> SessionResult<i64> {
        match self {
            Value::Int64(i) => Ok(*i),
            Value::Number(n) => n.as_i64().ok_or_else(|| self.mismatch("int64")),
            other => Err(other.mismatch("int64")),
        }
    }

    pub fn as_float(&self) -> SessionResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Number(n) => n.as_f64().ok_or_else(|| self.mismatch("float")),
            other => Err(other.mismatch("float")),
        }
    }

    /// Timestamps degrade to RFC 3339 strings on the wire, so a string is an
    /// acceptable source here.
    pub fn as_time(&self) -> SessionResult<DateTime<Utc>> {
        match self {
            Value::Time(t) => Ok(*t),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| self.mismatch("time")),
            other => Err(other.mismatch("time")),
        }
    }

    /// Byte sequences degrade to base64 strings on the wire.
    pub fn as_bytes(&self) -> SessionResult<Vec<u8>> {
        match self {
            Value::Bytes(b) => Ok(b.clone()),
            Value::String(s) => STANDARD.decode(s).map_err(|_| self.mismatch("bytes")),
            other => Err(other.mismatch("bytes")),
        }
    }

    /// Raw bytes of an opaque object, accepting the wire-degraded forms.
    pub fn as_object_bytes(&self) -> SessionResult<Vec<u8>> {
        match self {
            Value::Object(b) | Value::Bytes(b) => Ok(b.clone()),
            Value::String(s) => STANDARD.decode(s).map_err(|_| self.mismatch("object")),
            other => Err(other.mismatch("object")),
        }
    }

    pub(crate) fn to_json(&self) -> SessionResult<serde_json::Value> {
        Ok(match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i as i64).into()),
            Value::Int64(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| SessionError::codec("non-finite float cannot be stored"))?,
            Value::Time(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
            Value::Bytes(b) | Value::Object(b) => serde_json::Value::String(STANDARD.encode(b)),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
        })
    }

    pub(crate) fn from_json(value: serde_json::Value) -> SessionResult<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => Ok(Value::Number(n)),
            other => Err(SessionError::codec(format!(
                "unsupported payload value: {other}"
            ))),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_projections() {
        assert_eq!(Value::from("hi").as_string().unwrap(), "hi");
        assert_eq!(Value::from(5i32).as_int().unwrap(), 5);
        assert_eq!(Value::from(5i64).as_int64().unwrap(), 5);
        assert_eq!(Value::from(1.5f64).as_float().unwrap(), 1.5);
        assert!(Value::from(true).as_bool().unwrap());
    }

    #[test]
    fn projection_mismatch() {
        let err = Value::from(5i32).as_string().unwrap_err();
        match err {
            SessionError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "string");
                assert_eq!(found, "int");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn number_intermediate_resolves_without_loss() {
        let int = Value::Number(serde_json::Number::from(42i64));
        assert_eq!(int.as_int().unwrap(), 42);
        assert_eq!(int.as_int64().unwrap(), 42);
        assert_eq!(int.as_float().unwrap(), 42.0);

        let float = Value::Number(serde_json::Number::from_f64(2.5).unwrap());
        assert_eq!(float.as_float().unwrap(), 2.5);
        assert!(float.as_int().is_err());
        assert!(float.as_int64().is_err());
    }

    #[test]
    fn time_and_bytes_survive_wire_degradation() {
        let now = Utc::now();
        let wire = Value::Time(now).to_json().unwrap();
        let decoded = Value::from_json(wire).unwrap();
        assert_eq!(decoded.as_time().unwrap(), now);

        let wire = Value::Bytes(vec![1, 2, 3]).to_json().unwrap();
        let decoded = Value::from_json(wire).unwrap();
        assert_eq!(decoded.as_bytes().unwrap(), vec![1, 2, 3]);
    }
}
