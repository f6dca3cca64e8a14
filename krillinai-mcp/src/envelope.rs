//! The uniform `{error, msg, data}` response shape.
//!
//! Krillinai answers with this envelope and every tool returns it too:
//! `error = 0` on success, `error = 1` on failure, `data` carries the payload
//! (or `null`). Upstream envelopes are passed through as raw JSON so fields
//! this crate does not know about survive untouched.

use serde::Serialize;
use serde_json::Value;

/// `error` value signalling success.
pub const ERROR_NONE: i64 = 0;

/// `error` value signalling failure.
pub const ERROR_FAILED: i64 = 1;

/// A response envelope built by the connector itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// 0 for success, 1 for failure.
    pub error: i64,
    /// Human-readable message.
    pub msg: String,
    /// Payload, or `null`.
    pub data: Option<Value>,
}

impl Envelope {
    /// Successful envelope carrying `data`.
    pub fn success(msg: impl Into<String>, data: Value) -> Self {
        Self {
            error: ERROR_NONE,
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Failure envelope with `data = null`.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            error: ERROR_FAILED,
            msg: msg.into(),
            data: None,
        }
    }

    /// Failure envelope that still carries some context in `data`.
    pub fn failure_with(msg: impl Into<String>, data: Value) -> Self {
        Self {
            error: ERROR_FAILED,
            msg: msg.into(),
            data: Some(data),
        }
    }
}

impl From<Envelope> for Value {
    fn from(envelope: Envelope) -> Self {
        serde_json::json!({
            "error": envelope.error,
            "msg": envelope.msg,
            "data": envelope.data,
        })
    }
}

/// Whether a raw upstream envelope reports success (`error == 0`).
///
/// Integer and float zeros both count; anything else, including a missing
/// `error` key, does not.
pub fn is_success(envelope: &Value) -> bool {
    envelope
        .get("error")
        .and_then(Value::as_f64)
        .is_some_and(|code| code == 0.0)
}
