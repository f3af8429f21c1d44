//! Store-boundary embedding normalization.
//!
//! Storage layers hand back embeddings in several shapes: raw float
//! arrays, JSON-encoded or delimiter-separated strings, and wrapper
//! objects. Everything downstream of the store works with one typed
//! vector, so the conversion happens in exactly one place.

use serde_json::Value;

use crate::error::{Result, SiftError};

/// Object keys probed for a nested embedding payload, in order.
const WRAPPER_KEYS: [&str; 4] = ["embedding", "values", "vector", "data"];

/// Reduce a loosely-typed embedding payload to a validated `Vec<f32>`.
///
/// When `expected_dim` is set, a vector of any other length is rejected so
/// that a single malformed record cannot poison pairwise metrics. Callers
/// degrade the failing record to a neutral score; they never abort a batch.
pub fn normalize_embedding(raw: &Value, expected_dim: Option<usize>) -> Result<Vec<f32>> {
    let vector = match raw {
        Value::Array(items) => from_array(items)?,
        Value::String(s) => from_string(s)?,
        Value::Object(map) => {
            let nested = WRAPPER_KEYS
                .iter()
                .find_map(|k| map.get(*k))
                .ok_or_else(|| {
                    SiftError::invalid_embedding("object payload has no embedding key")
                })?;
            return normalize_embedding(nested, expected_dim);
        }
        other => {
            return Err(SiftError::invalid_embedding(format!(
                "unsupported payload type: {}",
                type_name(other)
            )))
        }
    };

    if vector.is_empty() {
        return Err(SiftError::invalid_embedding("empty vector"));
    }

    if vector.iter().any(|v| !v.is_finite()) {
        return Err(SiftError::invalid_embedding("non-finite component"));
    }

    if let Some(dim) = expected_dim {
        if vector.len() != dim {
            return Err(SiftError::invalid_embedding(format!(
                "dimension mismatch: {} != {}",
                vector.len(),
                dim
            )));
        }
    }

    Ok(vector)
}

fn from_array(items: &[Value]) -> Result<Vec<f32>> {
    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| SiftError::invalid_embedding("non-numeric array element"))
        })
        .collect()
}

fn from_string(s: &str) -> Result<Vec<f32>> {
    let trimmed = s.trim();

    // JSON-encoded array string.
    if trimmed.starts_with('[') {
        let parsed: Vec<f64> = serde_json::from_str(trimmed)
            .map_err(|e| SiftError::invalid_embedding(format!("bad JSON vector: {}", e)))?;
        return Ok(parsed.into_iter().map(|f| f as f32).collect());
    }

    // Comma / semicolon / whitespace delimited.
    trimmed
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| SiftError::invalid_embedding(format!("bad component: {:?}", t)))
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
