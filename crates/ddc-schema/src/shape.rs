//! Structural contracts: the declared shape a document must have.

use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

/// A value-format constraint on a string.
#[derive(Debug, Clone)]
pub enum Format {
    /// Exactly 64 lowercase hex characters
    Hex64,
    /// A semantic version (`1.2.3`, `1.0.0-rc.1`)
    SemVer,
    /// An RFC 3339 / ISO-8601 timestamp
    Timestamp,
    /// `sha256:` followed by 64 lowercase hex characters
    Sha256Digest,
    Pattern(Regex),
}

impl Format {
    pub fn name(&self) -> String {
        match self {
            Format::Hex64 => "64 lowercase hex characters".to_string(),
            Format::SemVer => "semantic version".to_string(),
            Format::Timestamp => "RFC 3339 timestamp".to_string(),
            Format::Sha256Digest => "sha256:<64 hex>".to_string(),
            Format::Pattern(re) => format!("pattern {}", re.as_str()),
        }
    }

    pub fn accepts(&self, s: &str) -> bool {
        match self {
            Format::Hex64 => is_hex64(s),
            Format::SemVer => semver::Version::parse(s).is_ok(),
            Format::Timestamp => DateTime::parse_from_rfc3339(s).is_ok(),
            Format::Sha256Digest => s.strip_prefix("sha256:").is_some_and(is_hex64),
            Format::Pattern(re) => re.is_match(s),
        }
    }
}

fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Constraints on a string value.
#[derive(Debug, Clone, Default)]
pub struct StringShape {
    pub formats: Vec<Format>,
    pub allowed: Option<Vec<String>>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
}

/// A named member of an object shape.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub required: bool,
    pub shape: Shape,
}

impl Field {
    pub fn required(name: &str, shape: Shape) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            shape,
        }
    }

    pub fn optional(name: &str, shape: Shape) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            shape,
        }
    }
}

/// Constraints on an object value.
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    pub fields: Vec<Field>,
    /// Whether members not listed in `fields` are permitted
    pub additional: bool,
}

/// The expected shape of a value.
#[derive(Debug, Clone)]
pub enum Shape {
    Any,
    String(StringShape),
    Integer { minimum: Option<i64> },
    Number { minimum: Option<f64> },
    Boolean,
    /// One of a fixed set of literal values, of any type
    Literal(Vec<Value>),
    Array {
        items: Box<Shape>,
        min_items: Option<usize>,
    },
    Object(ObjectShape),
}

impl Shape {
    pub fn string() -> Self {
        Shape::String(StringShape::default())
    }

    pub fn non_empty_string() -> Self {
        Shape::String(StringShape {
            min_len: Some(1),
            ..StringShape::default()
        })
    }

    pub fn formatted(format: Format) -> Self {
        Shape::String(StringShape {
            formats: vec![format],
            ..StringShape::default()
        })
    }

    pub fn one_of(values: &[&str]) -> Self {
        Shape::String(StringShape {
            allowed: Some(values.iter().map(|v| v.to_string()).collect()),
            ..StringShape::default()
        })
    }

    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
            min_items: None,
        }
    }

    /// An object that accepts members beyond `fields`.
    pub fn open_object(fields: Vec<Field>) -> Self {
        Shape::Object(ObjectShape {
            fields,
            additional: true,
        })
    }

    /// An object that rejects members not listed in `fields`.
    pub fn closed_object(fields: Vec<Field>) -> Self {
        Shape::Object(ObjectShape {
            fields,
            additional: false,
        })
    }
}

/// A named structural contract.
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub root: Shape,
}

impl Contract {
    pub fn new(name: impl Into<String>, root: Shape) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// The built-in contract for provenance manifests.
    pub fn manifest_v1() -> Self {
        let metadata = Shape::open_object(vec![
            Field::required("name", Shape::non_empty_string()),
            Field::optional("type", Shape::string()),
            Field::optional("version", Shape::string()),
            Field::optional("license", Shape::string()),
            Field::optional("description", Shape::string()),
        ]);

        let artifact = Shape::closed_object(vec![
            Field::required("path", Shape::non_empty_string()),
            Field::required("hash", Shape::formatted(Format::Sha256Digest)),
            Field::required("size", Shape::Integer { minimum: Some(0) }),
        ]);

        let integrity = Shape::closed_object(vec![
            Field::required("algorithm", Shape::one_of(&["sha256"])),
            Field::required("merkle_root", Shape::formatted(Format::Hex64)),
        ]);

        let signature = Shape::closed_object(vec![
            Field::optional("value", Shape::string()),
            Field::optional("timestamp", Shape::formatted(Format::Timestamp)),
        ]);

        let signing = Shape::closed_object(vec![
            Field::optional("scheme", Shape::one_of(&["minisign", "ed25519"])),
            Field::optional("key_id", Shape::non_empty_string()),
            Field::optional("signature", signature),
        ]);

        let root = Shape::open_object(vec![
            Field::required("schema_uri", Shape::non_empty_string()),
            Field::required("version", Shape::formatted(Format::SemVer)),
            Field::required("metadata", metadata),
            Field::optional("provenance", Shape::open_object(Vec::new())),
            Field::optional("artifacts", Shape::array(artifact)),
            Field::required("integrity", integrity),
            Field::optional("signing", signing),
        ]);

        Contract::new("manifest-v1", root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        let hex = "a".repeat(64);
        assert!(Format::Hex64.accepts(&hex));
        assert!(!Format::Hex64.accepts(&"a".repeat(63)));
        assert!(!Format::Hex64.accepts(&"A".repeat(64)));

        assert!(Format::SemVer.accepts("1.0.0"));
        assert!(Format::SemVer.accepts("2.1.0-rc.1"));
        assert!(!Format::SemVer.accepts("1.0"));

        assert!(Format::Timestamp.accepts("2025-03-01T12:00:00Z"));
        assert!(Format::Timestamp.accepts("2025-03-01T12:00:00+02:00"));
        assert!(!Format::Timestamp.accepts("yesterday"));

        assert!(Format::Sha256Digest.accepts(&format!("sha256:{hex}")));
        assert!(!Format::Sha256Digest.accepts(&hex));

        let pattern = Format::Pattern(Regex::new("^v[0-9]+$").unwrap());
        assert!(pattern.accepts("v12"));
        assert!(!pattern.accepts("12"));
    }
}
