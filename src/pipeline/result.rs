//! Outcome of one pipeline invocation.

use serde_json::{Map, Value};

/// Decoded JSON object returned by the model.
pub type Payload = Map<String, Value>;

/// Default for keys the model left out.
pub const NOT_AVAILABLE: &str = "Not available";

/// Reason recorded when a reply cannot be decoded.
pub const INVALID_JSON_REASON: &str = "invalid JSON from completion service";

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredResult {
    Ok(Payload),
    Failed(DecodeFailure),
}

/// A reply that could not be decoded, kept verbatim for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub reason: String,
    pub raw_text: String,
}

impl StructuredResult {
    pub fn failed(reason: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self::Failed(DecodeFailure {
            reason: reason.into(),
            raw_text: raw_text.into(),
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn into_payload(self) -> Result<Payload, DecodeFailure> {
        match self {
            Self::Ok(payload) => Ok(payload),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Read `key` as display text, defaulting to [`NOT_AVAILABLE`].
///
/// Lists of strings become markdown bullet lists; other non-string values
/// are rendered as JSON.
pub fn field_text(payload: &Payload, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::String(s) => format!("- {}", s),
                other => format!("- {}", other),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Object(obj)) if !obj.is_empty() => Value::Object(obj.clone()).to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
