//! Content normalization
//!
//! Agent output is usually a string that may carry a JSON document, either
//! bare or inside a ```` ```json ```` fence. Normalization turns such strings
//! into parsed JSON and leaves everything else alone. It never fails.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const JSON_FENCE_OPEN: &str = "```json";

fn json_fence_re() -> &'static Regex {
    static JSON_FENCE_RE: OnceLock<Regex> = OnceLock::new();
    JSON_FENCE_RE.get_or_init(|| Regex::new(r"(?s)```json(.*?)```").expect("valid json fence regex"))
}

/// Normalize a raw content value.
///
/// Non-string values are returned unchanged; strings go through
/// [`normalize_str`].
pub fn normalize(raw: &Value) -> Value {
    match raw {
        Value::String(s) => normalize_str(s),
        other => other.clone(),
    }
}

/// Parse a string as JSON when it looks like JSON, else return it as-is.
///
/// A string qualifies when, once trimmed, it starts with `{` or with a JSON
/// fence. When a fence is present its body is parsed, otherwise the whole
/// string is. Parse failures yield the original string.
pub fn normalize_str(raw: &str) -> Value {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with(JSON_FENCE_OPEN)) {
        return Value::String(raw.to_string());
    }

    let candidate = json_fence_re()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str())
        .filter(|body| !body.trim().is_empty())
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(candidate) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::trace!(error = %e, "Content looked like JSON but did not parse");
            Value::String(raw.to_string())
        }
    }
}
