//! The in-memory manifest document.
//!
//! A [`Manifest`] wraps the raw YAML mapping so that sections the core does not
//! interpret (`metadata`, `provenance`) are carried through untouched and the
//! original key order survives a load/save cycle.

use crate::error::ManifestError;
use crate::path::FieldPath;
use crate::types::{Artifact, Integrity, Signing};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// A provenance manifest held as a structured value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    doc: Mapping,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(doc: Mapping) -> Self {
        Self { doc }
    }

    /// Wrap a parsed value. The root must be a mapping.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        match value {
            Value::Mapping(doc) => Ok(Self { doc }),
            other => Err(ManifestError::MalformedDocument(format!(
                "document root must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Parse a manifest from YAML text. `<<` merge keys are resolved.
    pub fn from_yaml_str(text: &str) -> Result<Self, ManifestError> {
        let mut value: Value = serde_yaml::from_str(text)
            .map_err(|e| ManifestError::MalformedDocument(e.to_string()))?;
        value
            .apply_merge()
            .map_err(|e| ManifestError::MalformedDocument(format!("merge key: {e}")))?;
        Self::from_value(value)
    }

    /// Load a manifest from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            ManifestError::MalformedDocument(msg) => {
                ManifestError::MalformedDocument(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn to_yaml_string(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(&self.doc).map_err(|e| ManifestError::MalformedDocument(e.to_string()))
    }

    /// Write the manifest as YAML, preserving key order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ManifestError> {
        let path = path.as_ref();
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml).map_err(|e| ManifestError::io(path, e))
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    pub fn into_mapping(self) -> Mapping {
        self.doc
    }

    /// Look up a field. Absent (or null) intermediate sections yield `Ok(None)`;
    /// an intermediate that is present but not a mapping is a `MissingField` error.
    pub fn get(&self, path: &FieldPath) -> Result<Option<&Value>, ManifestError> {
        let (parents, last) = path.split_last();
        let mut current = &self.doc;
        for (depth, segment) in parents.iter().enumerate() {
            match current.get(segment.as_str()) {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::Mapping(next)) => current = next,
                Some(other) => {
                    return Err(not_a_mapping(&parents[..=depth], other));
                }
            }
        }
        Ok(current.get(last))
    }

    /// Set a field, creating intermediate sections as needed.
    ///
    /// Returns the previous value, if any.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<Option<Value>, ManifestError> {
        let (parents, last) = path.split_last();
        let mut current = &mut self.doc;
        for (depth, segment) in parents.iter().enumerate() {
            let key = Value::String(segment.clone());
            let slot = current
                .entry(key)
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if slot.is_null() {
                *slot = Value::Mapping(Mapping::new());
            }
            current = match slot {
                Value::Mapping(next) => next,
                other => return Err(not_a_mapping(&parents[..=depth], other)),
            };
        }
        Ok(current.insert(Value::String(last.to_string()), value))
    }

    /// Remove a field, keeping the position of its siblings and leaving
    /// the (possibly now empty) parent sections in place.
    pub fn remove(&mut self, path: &FieldPath) -> Result<Option<Value>, ManifestError> {
        let (parents, last) = path.split_last();
        let mut current = &mut self.doc;
        for (depth, segment) in parents.iter().enumerate() {
            match current.get_mut(segment.as_str()) {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::Mapping(next)) => current = next,
                Some(other) => return Err(not_a_mapping(&parents[..=depth], other)),
            }
        }
        Ok(current.shift_remove(last))
    }

    /// Extract a nested section as a manifest of its own.
    pub fn subdocument(&self, path: &FieldPath) -> Result<Manifest, ManifestError> {
        match self.get(path)? {
            Some(Value::Mapping(doc)) => Ok(Manifest::from_mapping(doc.clone())),
            Some(other) => Err(ManifestError::MissingField(format!(
                "{path} (expected a mapping, found {})",
                kind_of(other)
            ))),
            None => Err(ManifestError::MissingField(path.to_string())),
        }
    }

    pub fn schema_uri(&self) -> Option<&str> {
        self.doc.get("schema_uri").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.get("version").and_then(Value::as_str)
    }

    /// The `artifacts` list; an absent section is an empty list.
    pub fn artifacts(&self) -> Result<Vec<Artifact>, ManifestError> {
        Ok(self.section("artifacts")?.unwrap_or_default())
    }

    pub fn integrity(&self) -> Result<Option<Integrity>, ManifestError> {
        self.section("integrity")
    }

    pub fn signing(&self) -> Result<Option<Signing>, ManifestError> {
        self.section("signing")
    }

    fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ManifestError> {
        match self.doc.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| ManifestError::MalformedDocument(format!("section `{key}`: {e}"))),
        }
    }
}

fn not_a_mapping(segments: &[String], found: &Value) -> ManifestError {
    ManifestError::MissingField(format!(
        "{} (expected a mapping, found {})",
        segments.join("."),
        kind_of(found)
    ))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
