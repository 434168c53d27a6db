//! Compiles a JSON-Schema document into a [`Contract`].
//!
//! Only the structural subset needed for manifest contracts is understood:
//! `type`, `properties`, `required`, `additionalProperties`, `items`, `enum`,
//! `const`, `pattern`, `format`, `minLength`, `maxLength`, `minimum` and
//! `minItems`. Composition keywords (`$ref`, `allOf`, `anyOf`, `oneOf`, `not`)
//! are rejected rather than silently ignored. Unknown formats are treated as
//! annotations.

use crate::error::SchemaError;
use crate::shape::{Contract, Field, Format, ObjectShape, Shape, StringShape};
use regex::Regex;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

const UNSUPPORTED: &[&str] = &[
    "$ref",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "patternProperties",
    "dependentRequired",
];

impl Contract {
    /// Compile a contract from a parsed JSON-Schema document.
    pub fn from_json_schema(schema: &Value) -> Result<Self, SchemaError> {
        let name = schema
            .get("title")
            .or_else(|| schema.get("$id"))
            .and_then(Value::as_str)
            .unwrap_or("schema")
            .to_string();
        let root = compile(schema, "#")?;
        Ok(Contract::new(name, root))
    }

    /// Read and compile a JSON-Schema file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema: Value = serde_json::from_str(&text)?;
        Self::from_json_schema(&schema)
    }
}

fn compile(schema: &Value, at: &str) -> Result<Shape, SchemaError> {
    let obj = match schema {
        Value::Bool(true) => return Ok(Shape::Any),
        Value::Object(obj) => obj,
        _ => return Err(unsupported(at, "schema must be an object or `true`")),
    };

    if let Some(key) = UNSUPPORTED.iter().find(|k| obj.contains_key(**k)) {
        return Err(unsupported(at, format!("keyword `{key}`")));
    }

    if let Some(value) = obj.get("const") {
        return Ok(Shape::Literal(vec![value.clone()]));
    }

    let ty = match obj.get("type") {
        None => None,
        Some(Value::String(t)) => Some(t.as_str()),
        Some(other) => return Err(unsupported(at, format!("`type` must be a string, got {other}"))),
    };

    if let Some(values) = obj.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| unsupported(at, "`enum` must be an array"))?;
        let strings: Option<Vec<String>> = values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect();
        return Ok(match (ty, strings) {
            (None | Some("string"), Some(allowed)) => Shape::String(StringShape {
                allowed: Some(allowed),
                ..string_shape(obj, at)?
            }),
            _ => Shape::Literal(values.clone()),
        });
    }

    let inferred = ty.or_else(|| {
        if obj.contains_key("properties") || obj.contains_key("required") {
            Some("object")
        } else if obj.contains_key("items") {
            Some("array")
        } else {
            None
        }
    });

    match inferred {
        None => Ok(Shape::Any),
        Some("string") => Ok(Shape::String(string_shape(obj, at)?)),
        Some("integer") => Ok(Shape::Integer {
            minimum: match obj.get("minimum") {
                None => None,
                Some(v) => Some(
                    v.as_i64()
                        .ok_or_else(|| unsupported(at, "integer `minimum` must be an integer"))?,
                ),
            },
        }),
        Some("number") => Ok(Shape::Number {
            minimum: match obj.get("minimum") {
                None => None,
                Some(v) => Some(
                    v.as_f64()
                        .ok_or_else(|| unsupported(at, "`minimum` must be a number"))?,
                ),
            },
        }),
        Some("boolean") => Ok(Shape::Boolean),
        Some("null") => Ok(Shape::Literal(vec![Value::Null])),
        Some("array") => {
            let items = match obj.get("items") {
                Some(items) => compile(items, &format!("{at}/items"))?,
                None => Shape::Any,
            };
            Ok(Shape::Array {
                items: Box::new(items),
                min_items: usize_keyword(obj, "minItems", at)?,
            })
        }
        Some("object") => object_shape(obj, at).map(Shape::Object),
        Some(other) => Err(unsupported(at, format!("type `{other}`"))),
    }
}

fn string_shape(obj: &Map<String, Value>, at: &str) -> Result<StringShape, SchemaError> {
    let mut formats = Vec::new();

    if let Some(pattern) = obj.get("pattern") {
        let pattern = pattern
            .as_str()
            .ok_or_else(|| unsupported(at, "`pattern` must be a string"))?;
        let re = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            at: at.to_string(),
            source,
        })?;
        formats.push(Format::Pattern(re));
    }

    match obj.get("format").and_then(Value::as_str) {
        Some("date-time") => formats.push(Format::Timestamp),
        Some("semver") => formats.push(Format::SemVer),
        Some("hex64") => formats.push(Format::Hex64),
        Some("sha256-digest") => formats.push(Format::Sha256Digest),
        _ => {}
    }

    Ok(StringShape {
        formats,
        allowed: None,
        min_len: usize_keyword(obj, "minLength", at)?,
        max_len: usize_keyword(obj, "maxLength", at)?,
    })
}

fn object_shape(obj: &Map<String, Value>, at: &str) -> Result<ObjectShape, SchemaError> {
    let required: Vec<&str> = match obj.get("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .ok_or_else(|| unsupported(at, "`required` entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(unsupported(at, "`required` must be an array")),
    };

    let additional = match obj.get("additionalProperties") {
        None | Some(Value::Bool(true)) => true,
        Some(Value::Bool(false)) => false,
        Some(_) => {
            return Err(unsupported(
                at,
                "`additionalProperties` must be a boolean",
            ))
        }
    };

    let mut fields = Vec::new();
    if let Some(props) = obj.get("properties") {
        let props = props
            .as_object()
            .ok_or_else(|| unsupported(at, "`properties` must be an object"))?;
        for (name, schema) in props {
            fields.push(Field {
                name: name.clone(),
                required: required.contains(&name.as_str()),
                shape: compile(schema, &format!("{at}/properties/{name}"))?,
            });
        }
    }

    // Required names without a property schema still have to be present.
    for name in required {
        if !fields.iter().any(|f| f.name == name) {
            fields.push(Field::required(name, Shape::Any));
        }
    }

    Ok(ObjectShape { fields, additional })
}

fn usize_keyword(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<Option<usize>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| unsupported(at, format!("`{key}` must be a non-negative integer"))),
    }
}

fn unsupported(at: &str, detail: impl Into<String>) -> SchemaError {
    SchemaError::Unsupported {
        at: at.to_string(),
        detail: detail.into(),
    }
}
