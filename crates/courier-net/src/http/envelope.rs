//! Business envelope parsing and unwrapping.
//!
//! The backend wraps JSON payloads as `{retCode, retMsg, retData}`. Success
//! codes are `200`, `0` and `"0000"` (codes are compared strictly: `"200"`
//! is not a success code). `401` and `403` mean the session has expired.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::notifier::Notifier;
use super::response::Payload;
use crate::error::{PipelineError, Result, SESSION_EXPIRED_MESSAGE};
use courier_core::NoticeTitle;
use courier_core::logging::targets;

/// Default message for a business failure without `retMsg`.
pub const DEFAULT_BUSINESS_MESSAGE: &str = "system exception";

/// A business code: numeric or string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetCode {
    /// Numeric code, e.g. `200`.
    Number(i64),
    /// String code, e.g. `"0000"`.
    Text(String),
}

impl RetCode {
    /// Read a code from a JSON value. Integral floats count as numbers.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number).or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| Self::Number(f as i64))
            }),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// `200`, `0` or `"0000"`.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Number(n) => *n == 200 || *n == 0,
            Self::Text(s) => s == "0000",
        }
    }

    /// `401` or `403`.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Number(401) | Self::Number(403))
    }
}

impl std::fmt::Display for RetCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A parsed business envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct BusinessEnvelope {
    /// `retCode`, if present and a number or string.
    pub code: Option<RetCode>,
    /// `retMsg`, if present and non-empty.
    pub message: Option<String>,
    /// `retData`; `null` when absent.
    pub data: Value,
}

impl BusinessEnvelope {
    /// Parse a structured JSON body as an envelope.
    ///
    /// An array is structured but carries none of the envelope fields, so it
    /// parses as an envelope without a code. Returns `None` for scalars.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(object) => Some(Self {
                code: object.get("retCode").and_then(RetCode::from_value),
                message: object.get("retMsg").and_then(message_text),
                data: object.get("retData").cloned().unwrap_or(Value::Null),
            }),
            Value::Array(_) => Some(Self {
                code: None,
                message: None,
                data: Value::Null,
            }),
            _ => None,
        }
    }

    /// Parse an error body found behind a binary content type.
    ///
    /// These bodies come from a different backend path and may use `code` /
    /// `message` instead of `retCode` / `retMsg`; both spellings are accepted.
    pub fn from_sniffed(value: &Value) -> Self {
        let field = |primary: &str, fallback: &str| {
            value.get(primary).or_else(|| value.get(fallback)).cloned()
        };
        Self {
            code: field("retCode", "code").as_ref().and_then(RetCode::from_value),
            message: field("retMsg", "message").as_ref().and_then(message_text),
            data: field("retData", "data").unwrap_or(Value::Null),
        }
    }

    /// Whether the code is a success code.
    pub fn is_success(&self) -> bool {
        self.code.as_ref().is_some_and(RetCode::is_success)
    }

    /// Whether the code signals an expired session.
    pub fn is_session_expired(&self) -> bool {
        self.code.as_ref().is_some_and(RetCode::is_session_expired)
    }
}

/// A message field as display text: non-empty strings as-is, other scalars
/// rendered, `null`/empty treated as missing.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

/// Map an envelope to an outcome, presenting a notice on failure.
///
/// - success code: resolves with `retData` unchanged
/// - `401` / `403`: "login notice", rejects with the fixed session-expiry text
/// - anything else: "notice", rejects with `retMsg` or "system exception"
pub(crate) fn unwrap_envelope(envelope: BusinessEnvelope, notifier: &Notifier) -> Result<Payload> {
    if envelope.is_success() {
        return Ok(Payload::Data(envelope.data));
    }

    if envelope.is_session_expired() {
        tracing::info!(
            target: targets::CLASSIFIER,
            code = ?envelope.code,
            "session expired"
        );
        notifier.notify(NoticeTitle::LOGIN, SESSION_EXPIRED_MESSAGE);
        return Err(PipelineError::SessionExpired(
            SESSION_EXPIRED_MESSAGE.to_string(),
        ));
    }

    let message = envelope
        .message
        .unwrap_or_else(|| DEFAULT_BUSINESS_MESSAGE.to_string());
    tracing::debug!(
        target: targets::CLASSIFIER,
        code = ?envelope.code,
        %message,
        "business failure"
    );
    notifier.notify(NoticeTitle::NOTICE, &message);
    Err(PipelineError::Business {
        code: envelope.code,
        message,
    })
}
