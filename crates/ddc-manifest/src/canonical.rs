//! Canonical payload derivation.
//!
//! The signed payload is the manifest with its signature value removed,
//! serialized as compact JSON:
//!
//! - object keys sorted bytewise, at every level
//! - no insignificant whitespace, no trailing newline
//! - UTF-8, non-ASCII characters emitted literally, JSON string escaping
//! - integers in decimal, floats in shortest round-trip form
//!
//! Only the sorted mode feeds signature math. [`CanonicalMode::Document`]
//! renders the same stripped document as YAML in its original key order so a
//! human can audit what is about to be signed.

use crate::document::{kind_of, Manifest};
use crate::error::ManifestError;
use crate::path::FieldPath;
use serde_json::Value as JsonValue;
use serde_yaml::Value;

/// Maximum nesting depth accepted by the canonicalizer.
const MAX_DEPTH: usize = 128;

/// How a payload is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalMode {
    /// Sorted-key compact JSON; the only form that is ever signed.
    #[default]
    Sorted,
    /// YAML in document key order, for display.
    Document,
}

/// Derive the bytes that are signed and verified.
pub fn canonical_payload(
    manifest: &Manifest,
    value_path: &FieldPath,
) -> Result<Vec<u8>, ManifestError> {
    render_payload(manifest, value_path, CanonicalMode::Sorted)
}

/// Render the stripped document in the requested mode.
pub fn render_payload(
    manifest: &Manifest,
    value_path: &FieldPath,
    mode: CanonicalMode,
) -> Result<Vec<u8>, ManifestError> {
    let mut stripped = manifest.clone();
    stripped.remove(value_path)?;

    // Both modes must accept exactly the same documents.
    let json = to_json_value(&Value::Mapping(stripped.as_mapping().clone()))?;

    match mode {
        CanonicalMode::Sorted => {
            let mut out = String::new();
            write_sorted(&json, &mut out);
            Ok(out.into_bytes())
        }
        CanonicalMode::Document => Ok(stripped.to_yaml_string()?.into_bytes()),
    }
}

/// Convert a YAML value into JSON, rejecting anything without a canonical form.
///
/// Scalar keys are stringified (`true`, `1`, `null`); float, sequence and
/// mapping keys are rejected, as are tagged values and non-finite floats.
pub fn to_json_value(value: &Value) -> Result<JsonValue, ManifestError> {
    convert(value, 0)
}

fn convert(value: &Value, depth: usize) -> Result<JsonValue, ManifestError> {
    if depth > MAX_DEPTH {
        return Err(ManifestError::Canonicalization(format!(
            "document nested deeper than {MAX_DEPTH} levels"
        )));
    }

    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Number(n) => convert_number(n).map(JsonValue::Number),
        Value::String(s) => Ok(JsonValue::String(s.clone())),
        Value::Sequence(items) => items
            .iter()
            .map(|item| convert(item, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (key, item) in map {
                let key = key_string(key)?;
                let item = convert(item, depth + 1)?;
                if object.insert(key.clone(), item).is_some() {
                    return Err(ManifestError::Canonicalization(format!(
                        "duplicate key `{key}` after key normalization"
                    )));
                }
            }
            Ok(JsonValue::Object(object))
        }
        Value::Tagged(tagged) => Err(ManifestError::Canonicalization(format!(
            "tagged value `{}` has no canonical form",
            tagged.tag
        ))),
    }
}

fn convert_number(n: &serde_yaml::Number) -> Result<serde_json::Number, ManifestError> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| ManifestError::Canonicalization(format!("non-finite number `{n}`")))
}

fn key_string(key: &Value) -> Result<String, ManifestError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Number(n) if !n.is_f64() => Ok(n.to_string()),
        Value::Number(n) => Err(ManifestError::Canonicalization(format!(
            "float key `{n}` has no canonical form"
        ))),
        other => Err(ManifestError::Canonicalization(format!(
            "{} keys have no canonical form",
            kind_of(other)
        ))),
    }
}

fn write_sorted(value: &JsonValue, out: &mut String) {
    match value {
        JsonValue::Object(map) => {
            let mut entries: Vec<(&String, &JsonValue)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_sorted(item, out);
            }
            out.push('}');
        }
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_sorted(item, out);
            }
            out.push(']');
        }
        JsonValue::String(s) => write_string(s, out),
        // null, booleans and numbers have a single compact rendering
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&JsonValue::from(s).to_string());
}
