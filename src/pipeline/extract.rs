//! Payload extraction strategies.
//!
//! The webhook is fed by host-controlled automation tools that disagree on how
//! to serialize a request: some send strict JSON, some form-encode the same
//! fields, and some emit near-JSON with smart quotes or stray control
//! characters inside string values. Extraction runs a fixed priority chain of
//! pure decode strategies over the raw body; the first one that produces a
//! field mapping wins, and nothing is merged across strategies.

use super::types::ExtractError;
use serde_json::{Map, Value};

/// Decoded request fields keyed by name.
pub type FieldMap = Map<String, Value>;

/// Decode a raw request body into a field mapping.
///
/// Strategy order: strict JSON, form-urlencoded (when declared), repaired-text
/// JSON. When every strategy fails the error carries the strict decoder's
/// message, since that is the most useful diagnostic for callers.
pub fn extract_fields(body: &[u8], content_type: Option<&str>) -> Result<FieldMap, ExtractError> {
    let strict_error = match decode_json(body) {
        Ok(fields) => {
            tracing::debug!(strategy = "json", fields = fields.len(), "Payload decoded");
            return Ok(fields);
        }
        Err(err) => err,
    };

    if let Some(fields) = decode_form(body, content_type) {
        tracing::debug!(strategy = "form", fields = fields.len(), "Payload decoded");
        return Ok(fields);
    }

    if let Some(fields) = decode_repaired(body) {
        tracing::warn!(
            strategy = "repaired",
            fields = fields.len(),
            "Payload decoded only after text repair"
        );
        return Ok(fields);
    }

    tracing::error!(error = %strict_error, "Payload could not be decoded by any strategy");
    Err(ExtractError::MalformedPayload(strict_error))
}

/// Strict JSON decode; only top-level objects qualify as a field mapping.
fn decode_json(body: &[u8]) -> Result<FieldMap, String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_type_name(&other))),
        Err(err) => Err(err.to_string()),
    }
}

/// Form-urlencoded decode, attempted only when the caller declared the form
/// content type. Values stay strings; a string-typed `embedding` flows into
/// the delimited-string path of the normalizer.
fn decode_form(body: &[u8], content_type: Option<&str>) -> Option<FieldMap> {
    if !content_type.is_some_and(|value| value.starts_with("application/x-www-form-urlencoded")) {
        return None;
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
    if pairs.is_empty() {
        return None;
    }

    let mut fields = FieldMap::new();
    for (key, value) in pairs {
        fields.insert(key, Value::String(value));
    }
    Some(fields)
}

/// Best-effort repair of near-JSON bodies followed by a second strict decode.
fn decode_repaired(body: &[u8]) -> Option<FieldMap> {
    let repaired = repair_text(&String::from_utf8_lossy(body));
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

/// Strip ASCII control characters and normalize smart quotes.
///
/// Unescaped newlines inside string values and curly quotes around keys are
/// the two corruptions observed from upstream automation tools.
fn repair_text(raw: &str) -> String {
    raw.chars()
        .filter_map(|ch| match ch {
            '\u{201c}' | '\u{201d}' => Some('"'),
            '\u{2018}' | '\u{2019}' => Some('\''),
            ch if ch.is_ascii_control() => None,
            ch => Some(ch),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
