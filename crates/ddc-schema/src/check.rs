//! Walks a JSON value against a [`Contract`] and collects every violation.

use crate::shape::{Contract, ObjectShape, Shape, StringShape};
use ddc_manifest::{to_json_value, Manifest, ManifestError};
use serde_json::Value;
use thiserror::Error;

/// Why a value failed its contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViolationKind {
    #[error("required field is missing")]
    Missing,

    #[error("expected {expected}, found {found}")]
    WrongType { expected: String, found: String },

    #[error("value does not match format: {format}")]
    WrongFormat { format: String },

    #[error("value {value} is not one of [{}]", .allowed.join(", "))]
    DisallowedValue { value: String, allowed: Vec<String> },

    #[error("out of range: {detail}")]
    OutOfRange { detail: String },

    #[error("field is not permitted here")]
    UnexpectedField,
}

/// A single failed check, located by a dotted path with `[i]` list indices.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}: {kind}", display_path(.path))]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}

/// Check `value` against `contract`. An empty result means the value conforms.
pub fn check(contract: &Contract, value: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    check_value(&contract.root, value, "", &mut out);
    out
}

/// Check a manifest document against `contract`.
pub fn check_manifest(
    contract: &Contract,
    manifest: &Manifest,
) -> Result<Vec<Violation>, ManifestError> {
    let json = to_json_value(&ddc_manifest::Value::Mapping(manifest.as_mapping().clone()))?;
    Ok(check(contract, &json))
}

/// Confirm that a document declares the expected `schema_uri`.
pub fn check_schema_uri(document: &Value, expected: &str) -> Option<Violation> {
    match document.get("schema_uri") {
        None => Some(Violation::new("schema_uri", ViolationKind::Missing)),
        Some(Value::String(uri)) if uri == expected => None,
        Some(Value::String(uri)) => Some(Violation::new(
            "schema_uri",
            ViolationKind::DisallowedValue {
                value: format!("{uri:?}"),
                allowed: vec![format!("{expected:?}")],
            },
        )),
        Some(other) => Some(Violation::new(
            "schema_uri",
            ViolationKind::WrongType {
                expected: "string".to_string(),
                found: type_name(other).to_string(),
            },
        )),
    }
}

fn check_value(shape: &Shape, value: &Value, path: &str, out: &mut Vec<Violation>) {
    match shape {
        Shape::Any => {}
        Shape::String(s) => match value {
            Value::String(text) => check_string(s, text, path, out),
            other => out.push(wrong_type(path, "string", other)),
        },
        Shape::Integer { minimum } => {
            if let Some(n) = value.as_i64() {
                if let Some(min) = minimum.filter(|min| n < *min) {
                    out.push(out_of_range(path, format!("{n} is less than {min}")));
                }
            } else if value.as_u64().is_none() {
                // Anything beyond i64::MAX is above every minimum.
                out.push(wrong_type(path, "integer", value));
            }
        }
        Shape::Number { minimum } => match value.as_f64() {
            Some(n) => {
                if let Some(min) = minimum.filter(|min| n < *min) {
                    out.push(out_of_range(path, format!("{n} is less than {min}")));
                }
            }
            None => out.push(wrong_type(path, "number", value)),
        },
        Shape::Boolean => {
            if !value.is_boolean() {
                out.push(wrong_type(path, "boolean", value));
            }
        }
        Shape::Literal(allowed) => {
            if !allowed.contains(value) {
                out.push(Violation::new(
                    path,
                    ViolationKind::DisallowedValue {
                        value: value.to_string(),
                        allowed: allowed.iter().map(Value::to_string).collect(),
                    },
                ));
            }
        }
        Shape::Array { items, min_items } => match value {
            Value::Array(list) => {
                if let Some(min) = min_items.filter(|min| list.len() < *min) {
                    out.push(out_of_range(
                        path,
                        format!("{} items, at least {min} required", list.len()),
                    ));
                }
                for (i, item) in list.iter().enumerate() {
                    check_value(items, item, &format!("{path}[{i}]"), out);
                }
            }
            other => out.push(wrong_type(path, "array", other)),
        },
        Shape::Object(obj) => match value {
            Value::Object(map) => check_object(obj, map, path, out),
            other => out.push(wrong_type(path, "object", other)),
        },
    }
}

fn check_string(shape: &StringShape, text: &str, path: &str, out: &mut Vec<Violation>) {
    let len = text.chars().count();
    if let Some(min) = shape.min_len.filter(|min| len < *min) {
        out.push(out_of_range(
            path,
            format!("length {len} is shorter than {min}"),
        ));
    }
    if let Some(max) = shape.max_len.filter(|max| len > *max) {
        out.push(out_of_range(path, format!("length {len} is longer than {max}")));
    }

    if let Some(allowed) = &shape.allowed {
        if !allowed.iter().any(|a| a == text) {
            out.push(Violation::new(
                path,
                ViolationKind::DisallowedValue {
                    value: format!("{text:?}"),
                    allowed: allowed.iter().map(|a| format!("{a:?}")).collect(),
                },
            ));
        }
    }

    for format in &shape.formats {
        if !format.accepts(text) {
            out.push(Violation::new(
                path,
                ViolationKind::WrongFormat {
                    format: format.name(),
                },
            ));
        }
    }
}

fn check_object(
    shape: &ObjectShape,
    map: &serde_json::Map<String, Value>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    for field in &shape.fields {
        let child = child_path(path, &field.name);
        match map.get(&field.name) {
            Some(Value::Null) if !field.required => {}
            Some(value) => check_value(&field.shape, value, &child, out),
            None if field.required => out.push(Violation::new(child, ViolationKind::Missing)),
            None => {}
        }
    }

    if !shape.additional {
        for key in map.keys() {
            if !shape.fields.iter().any(|f| &f.name == key) {
                out.push(Violation::new(
                    child_path(path, key),
                    ViolationKind::UnexpectedField,
                ));
            }
        }
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn wrong_type(path: &str, expected: &str, found: &Value) -> Violation {
    Violation::new(
        path,
        ViolationKind::WrongType {
            expected: expected.to_string(),
            found: type_name(found).to_string(),
        },
    )
}

fn out_of_range(path: &str, detail: String) -> Violation {
    Violation::new(path, ViolationKind::OutOfRange { detail })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Field, Format};
    use serde_json::json;

    #[test]
    fn test_nested_paths() {
        let contract = Contract::new(
            "t",
            Shape::open_object(vec![Field::required(
                "artifacts",
                Shape::array(Shape::closed_object(vec![Field::required(
                    "size",
                    Shape::Integer { minimum: Some(0) },
                )])),
            )]),
        );

        let value = json!({"artifacts": [{"size": 1}, {"size": -1}, {"size": 2, "extra": true}]});
        let violations = check(&contract, &value);

        assert_eq!(
            violations,
            vec![
                Violation::new(
                    "artifacts[1].size",
                    ViolationKind::OutOfRange {
                        detail: "-1 is less than 0".to_string()
                    }
                ),
                Violation::new("artifacts[2].extra", ViolationKind::UnexpectedField),
            ]
        );
    }

    #[test]
    fn test_wrong_type_and_missing() {
        let contract = Contract::new(
            "t",
            Shape::open_object(vec![
                Field::required("name", Shape::string()),
                Field::required("count", Shape::Integer { minimum: None }),
                Field::optional("flag", Shape::Boolean),
            ]),
        );

        let violations = check(&contract, &json!({"name": 3, "flag": "yes"}));
        assert_eq!(violations.len(), 3);
        assert_eq!(
            violations[0].kind,
            ViolationKind::WrongType {
                expected: "string".to_string(),
                found: "integer".to_string()
            }
        );
        assert_eq!(violations[1].path, "count");
        assert_eq!(violations[1].kind, ViolationKind::Missing);
        assert_eq!(violations[2].path, "flag");
    }

    #[test]
    fn test_null_optional_is_absent() {
        let contract = Contract::new(
            "t",
            Shape::open_object(vec![
                Field::required("name", Shape::string()),
                Field::optional("flag", Shape::Boolean),
            ]),
        );

        assert!(check(&contract, &json!({"name": "x", "flag": null})).is_empty());

        let violations = check(&contract, &json!({"name": null}));
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].kind,
            ViolationKind::WrongType {
                expected: "string".to_string(),
                found: "null".to_string()
            }
        );
    }

    #[test]
    fn test_root_type_mismatch() {
        let contract = Contract::manifest_v1();
        let violations = check(&contract, &json!([1, 2]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "");
        assert_eq!(
            violations[0].to_string(),
            "(root): expected object, found array"
        );
    }

    #[test]
    fn test_string_constraints() {
        let shape = Shape::String(StringShape {
            formats: vec![Format::Hex64],
            allowed: None,
            min_len: Some(2),
            max_len: Some(4),
        });
        let contract = Contract::new("t", shape);

        let violations = check(&contract, &json!("abcdef"));
        assert_eq!(violations.len(), 2);
        assert!(matches!(violations[0].kind, ViolationKind::OutOfRange { .. }));
        assert!(matches!(violations[1].kind, ViolationKind::WrongFormat { .. }));
    }

    #[test]
    fn test_literal() {
        let contract = Contract::new("t", Shape::Literal(vec![json!(1), json!(null)]));
        assert!(check(&contract, &json!(null)).is_empty());
        let violations = check(&contract, &json!(2));
        assert_eq!(
            violations[0].to_string(),
            "(root): value 2 is not one of [1, null]"
        );
    }

    #[test]
    fn test_check_schema_uri() {
        let doc = json!({"schema_uri": "schema/manifest.schema.json"});
        assert!(check_schema_uri(&doc, "schema/manifest.schema.json").is_none());

        let violation = check_schema_uri(&doc, "schema/other.json").unwrap();
        assert_eq!(violation.path, "schema_uri");
        assert!(matches!(
            violation.kind,
            ViolationKind::DisallowedValue { .. }
        ));

        let violation = check_schema_uri(&json!({}), "x").unwrap();
        assert_eq!(violation.kind, ViolationKind::Missing);

        let violation = check_schema_uri(&json!({"schema_uri": 7}), "x").unwrap();
        assert!(matches!(violation.kind, ViolationKind::WrongType { .. }));
    }
}
