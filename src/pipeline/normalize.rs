//! Record normalization: embedding coercion, identifier derivation, and
//! metadata projection.

use super::extract::FieldMap;
use super::types::{CanonicalRecord, NormalizeError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Prefix applied to every vector identifier stored in the index.
pub const VECTOR_ID_PREFIX: &str = "tennis-";

/// Marker appended to metadata values that were cut at their cap.
pub const TRUNCATION_MARKER: &str = "…[truncated]";

/// Metadata whitelist with per-field character caps.
///
/// Short categorical fields are capped tightly; long free-text fields get
/// more room. Anything not listed here never reaches the index.
const METADATA_FIELDS: &[(&str, usize)] = &[
    ("content_id", 100),
    ("short_summary", 500),
    ("key_takeaways", 500),
    ("detailed_analysis", 1000),
    ("tennis_topics", 200),
    ("coaching_style", 100),
    ("skill_level", 50),
    ("player_references", 200),
    ("common_problems", 500),
    ("key_tags", 200),
    ("equipment_required", 200),
    ("time_investment", 100),
    ("solutions_provided", 500),
    ("user_keywords", 200),
    ("immediate_actionable", 500),
    ("video_title", 200),
    ("full_transcript", 1000),
    ("content_text", 1000),
    ("youtube_url", 200),
];

/// Turn a decoded field mapping into a canonical record, or reject it.
///
/// Validation happens entirely in memory, before any network call: the
/// embedding is resolved and coerced, its length is checked against the index
/// dimensionality, the identifier is derived, and the metadata whitelist is
/// projected. No record with a wrong-length vector ever leaves this function.
pub fn normalize(
    fields: &FieldMap,
    expected_dimension: usize,
) -> Result<CanonicalRecord, NormalizeError> {
    let embedding = resolve_embedding(fields.get("embedding"))?;

    if embedding.len() != expected_dimension {
        return Err(NormalizeError::EmbeddingDimensionMismatch {
            expected: expected_dimension,
            observed: embedding.len(),
        });
    }

    let id = derive_vector_id(fields.get("content_id"))?;
    let metadata = project_metadata(fields);

    Ok(CanonicalRecord {
        id,
        embedding,
        metadata,
    })
}

/// Resolve the embedding field into a float vector.
///
/// Accepted shapes, in order of preference: a numeric array (entries may be
/// numeric strings), a comma-delimited string, or an already-shaped vector
/// object carrying a `values` sub-field. An absent field resolves to an empty
/// vector and is then rejected by the dimension check.
fn resolve_embedding(value: Option<&Value>) -> Result<Vec<f64>, NormalizeError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => entries.iter().map(coerce_entry).collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(parse_float)
            .collect(),
        Some(Value::Object(map)) => match map.get("values") {
            Some(inner @ (Value::Array(_) | Value::String(_))) => resolve_embedding(Some(inner)),
            _ => Err(NormalizeError::UnsupportedEmbeddingType(
                "object without a values array",
            )),
        },
        Some(Value::Number(_)) => Err(NormalizeError::UnsupportedEmbeddingType("number")),
        Some(Value::Bool(_)) => Err(NormalizeError::UnsupportedEmbeddingType("boolean")),
    }
}

fn coerce_entry(value: &Value) -> Result<f64, NormalizeError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| NormalizeError::InvalidEmbeddingValues(number.to_string())),
        Value::String(text) => parse_float(text.trim()),
        other => Err(NormalizeError::InvalidEmbeddingValues(other.to_string())),
    }
}

fn parse_float(segment: &str) -> Result<f64, NormalizeError> {
    segment
        .parse::<f64>()
        .map_err(|_| NormalizeError::InvalidEmbeddingValues(segment.to_string()))
}

/// Derive the vector identifier from `content_id`.
///
/// The record is rejected outright when the field is absent or blank; an
/// unnamed vector would be unaddressable for later replacement.
fn derive_vector_id(value: Option<&Value>) -> Result<String, NormalizeError> {
    let content_id = match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };

    if content_id.is_empty() {
        return Err(NormalizeError::MissingIdentifier);
    }

    Ok(format!("{VECTOR_ID_PREFIX}{content_id}"))
}

/// Project the whitelisted metadata fields, capping each value independently.
///
/// Null values and unknown keys are dropped; empty strings survive as empty
/// strings so a caller can deliberately blank a field.
fn project_metadata(fields: &FieldMap) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for &(name, cap) in METADATA_FIELDS {
        let Some(value) = fields.get(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        metadata.insert(name.to_string(), truncate_value(stringify(value), cap));
    }
    metadata
}

/// Coerce an arbitrary source value into its stored string form.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Cap a value at `cap` characters, appending the truncation marker when cut.
fn truncate_value(mut text: String, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        Some((byte_index, _)) => {
            text.truncate(byte_index);
            text.push_str(TRUNCATION_MARKER);
            text
        }
        None => text,
    }
}
