//! Integrity scope: which files are tracked for tamper detection.

use crate::error::InventoryError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Include patterns used when none are configured.
pub const DEFAULT_INCLUDES: &[&str] = &["core/**", "tools/**", "README.md", "LICENSE", "Makefile"];

/// Build outputs, caches and version-control metadata; always excluded.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/**",
    "**/.git/**",
    "target/**",
    "**/__pycache__/**",
    "**/*.pyc",
    "**/node_modules/**",
    "**/.venv/**",
    "**/.DS_Store",
];

/// A compiled set of include and exclude glob patterns.
///
/// Patterns match `/`-separated paths relative to the inventory root. `*`
/// never crosses a separator; `**` spans any number of directories.
#[derive(Debug, Clone)]
pub struct IntegrityScope {
    include: GlobSet,
    exclude: GlobSet,
    /// Directories whose whole subtree is excluded (`dir/**` patterns).
    pruned: GlobSet,
    /// Literal leading components of each include pattern.
    include_prefixes: Vec<Vec<String>>,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl IntegrityScope {
    /// Compile a scope. `exclude` is added on top of [`DEFAULT_EXCLUDES`].
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, InventoryError> {
        let include_patterns: Vec<String> =
            include.iter().map(|p| p.as_ref().to_string()).collect();
        let exclude_patterns: Vec<String> = DEFAULT_EXCLUDES
            .iter()
            .map(|p| p.to_string())
            .chain(exclude.iter().map(|p| p.as_ref().to_string()))
            .collect();

        let pruned: Vec<String> = exclude_patterns
            .iter()
            .filter_map(|p| p.strip_suffix("/**"))
            .filter(|dir| !dir.is_empty() && *dir != "**")
            .map(str::to_string)
            .collect();
        let include_prefixes = include_patterns.iter().map(|p| literal_prefix(p)).collect();

        Ok(Self {
            include: compile(&include_patterns)?,
            exclude: compile(&exclude_patterns)?,
            pruned: compile(&pruned)?,
            include_prefixes,
            include_patterns,
            exclude_patterns,
        })
    }

    /// The scope tracked by default: [`DEFAULT_INCLUDES`] minus [`DEFAULT_EXCLUDES`].
    pub fn with_defaults() -> Result<Self, InventoryError> {
        Self::new::<&str>(DEFAULT_INCLUDES, &[])
    }

    /// True if `path` is included and not excluded.
    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// False if no file under directory `dir` can be in scope, so a walk
    /// may skip it. Conservative: true whenever a match is possible.
    pub fn may_contain(&self, dir: &str) -> bool {
        if self.pruned.is_match(dir) {
            return false;
        }
        let dir: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
        self.include_prefixes.iter().any(|prefix| {
            let n = prefix.len().min(dir.len());
            prefix[..n].iter().zip(&dir[..n]).all(|(a, b)| a == b)
        })
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }
}

fn literal_prefix(pattern: &str) -> Vec<String> {
    pattern
        .split('/')
        .take_while(|part| !part.contains(['*', '?', '[', '{', '\\']))
        .map(str::to_string)
        .collect()
}

fn compile(patterns: &[String]) -> Result<GlobSet, InventoryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| InventoryError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| InventoryError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scope() {
        let scope = IntegrityScope::with_defaults().unwrap();
        assert!(scope.is_match("core/main.py"));
        assert!(scope.is_match("core/pkg/deep/file.py"));
        assert!(scope.is_match("README.md"));
        assert!(!scope.is_match("docs/README.md"));
        assert!(!scope.is_match("manifest/core-v1.manifest.yaml"));
    }

    #[test]
    fn test_default_excludes_apply() {
        let scope = IntegrityScope::with_defaults().unwrap();
        assert!(!scope.is_match("core/__pycache__/main.cpython-311.pyc"));
        assert!(!scope.is_match("core/module.pyc"));
        assert!(!scope.is_match("tools/.git/HEAD"));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let scope = IntegrityScope::new(&["*.md"], &[]).unwrap();
        assert!(scope.is_match("README.md"));
        assert!(!scope.is_match("docs/guide.md"));
    }

    #[test]
    fn test_extra_excludes() {
        let scope = IntegrityScope::new(&["core/**"], &["core/generated/**"]).unwrap();
        assert!(scope.is_match("core/a.rs"));
        assert!(!scope.is_match("core/generated/b.rs"));
    }

    #[test]
    fn test_empty_scope_matches_nothing() {
        let scope = IntegrityScope::new::<&str>(&[], &[]).unwrap();
        assert!(!scope.is_match("README.md"));
    }

    #[test]
    fn test_may_contain() {
        let scope = IntegrityScope::new(&["core/**", "tools/*.py", "README.md"], &["core/gen/**"])
            .unwrap();
        assert!(scope.may_contain("core"));
        assert!(scope.may_contain("core/pkg/deep"));
        assert!(scope.may_contain("tools"));
        assert!(!scope.may_contain("scratch"));
        assert!(!scope.may_contain("docs/api"));
        assert!(!scope.may_contain("core/gen"));
        assert!(!scope.may_contain("core/gen/nested"));
        assert!(!scope.may_contain("target"));
        assert!(!scope.may_contain(".git"));
        assert!(!scope.may_contain("core/__pycache__"));
    }

    #[test]
    fn test_leading_wildcard_may_contain_anything() {
        let scope = IntegrityScope::new(&["**/*.md"], &[]).unwrap();
        assert!(scope.may_contain("docs"));
        assert!(scope.may_contain("a/b/c"));
        assert!(!scope.may_contain("node_modules"));
        assert!(!scope.may_contain("pkg/node_modules"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = IntegrityScope::new(&["core/[unclosed"], &[]);
        assert!(matches!(result, Err(InventoryError::InvalidPattern { .. })));
    }
}
