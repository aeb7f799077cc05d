//! Pulling a JSON object out of free model text.
//!
//! Both functions are pure: the same reply always yields the same result.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::result::{StructuredResult, INVALID_JSON_REASON};

static FENCED_OBJECT: OnceLock<Vec<Regex>> = OnceLock::new();

/// Fence patterns in priority order.
///
/// Captures are anchored on a closing brace followed by the closing fence,
/// so a fence inside a JSON string value does not end the block. The lazy
/// form wins when several blocks are present; the greedy form covers a `}`
/// that appears right before an inner fence.
fn fenced_object() -> &'static [Regex] {
    FENCED_OBJECT.get_or_init(|| {
        [
            r"(?si)```json\s*(\{.*?\})\s*```",
            r"(?si)```json\s*(\{.*\})\s*```",
            r"(?s)```\s*(\{.*?\})\s*```",
            r"(?s)```\s*(\{.*\})\s*```",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("fence pattern is valid"))
        .collect()
    })
}

fn is_json(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// Return the text that should hold the JSON object.
///
/// A reply that already is JSON is taken whole. Otherwise a
/// ```` ```json ```` fence wins over an untagged one. When nothing decodes,
/// the trimmed reply is returned so the parse error describes it.
pub fn extract_json_candidate(reply: &str) -> &str {
    let whole = reply.trim();
    if is_json(whole) {
        return whole;
    }

    fenced_object()
        .iter()
        .filter_map(|re| re.captures(reply).and_then(|caps| caps.get(1)))
        .map(|inner| inner.as_str().trim())
        .find(|candidate| is_json(candidate))
        .unwrap_or(whole)
}

/// Decode a model reply into a [`StructuredResult`].
pub fn parse_reply(reply: &str) -> StructuredResult {
    let candidate = extract_json_candidate(reply);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(payload)) => StructuredResult::Ok(payload),
        Ok(other) => StructuredResult::failed(
            format!(
                "{}: expected an object, got {}",
                INVALID_JSON_REASON,
                json_kind(&other)
            ),
            reply,
        ),
        Err(e) => StructuredResult::failed(format!("{}: {}", INVALID_JSON_REASON, e), reply),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
