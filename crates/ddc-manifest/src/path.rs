//! Dotted field paths into a manifest document.

use crate::error::ManifestError;
use std::fmt;
use std::str::FromStr;

/// A path to a field inside a nested mapping, e.g. `signing.signature.value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let segments: Vec<String> = text.split('.').map(str::to_string).collect();
        if text.is_empty() || segments.iter().any(String::is_empty) {
            return Err(ManifestError::MissingField(format!(
                "invalid field path '{text}'"
            )));
        }
        Ok(Self { segments })
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(ManifestError::MissingField(
                "field path must have at least one non-empty segment".to_string(),
            ));
        }
        Ok(Self { segments })
    }

    pub(crate) fn from_static(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split into the parent segments and the final key.
    pub fn split_last(&self) -> (&[String], &str) {
        // Construction guarantees at least one segment.
        let (last, parents) = self
            .segments
            .split_last()
            .map(|(last, rest)| (last.as_str(), rest))
            .unwrap_or(("", &[]));
        (parents, last)
    }

    /// Append another path below this one.
    pub fn join(&self, child: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(child.segments.iter().cloned());
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_path() {
        let path = FieldPath::parse("signing.signature.value").unwrap();
        assert_eq!(path.segments(), ["signing", "signature", "value"]);
        assert_eq!(path.to_string(), "signing.signature.value");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("signing..value").is_err());
        assert!(FieldPath::parse(".value").is_err());
    }

    #[test]
    fn test_split_last() {
        let path = FieldPath::parse("a.b.c").unwrap();
        let (parents, last) = path.split_last();
        assert_eq!(parents, ["a", "b"]);
        assert_eq!(last, "c");
    }

    #[test]
    fn test_join() {
        let root = FieldPath::parse("doc_index").unwrap();
        let child = FieldPath::parse("signing.signature.value").unwrap();
        assert_eq!(
            root.join(&child).to_string(),
            "doc_index.signing.signature.value"
        );
    }
}
