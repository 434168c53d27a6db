//! Locating manifests in a directory tree.

use crate::document::Manifest;
use crate::error::ManifestError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for manifests.
const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules", "__pycache__", ".venv"];

/// Find every YAML file under `dir` that looks like a manifest, i.e. parses
/// to a mapping carrying a `schema_uri` key. Results are sorted.
///
/// Files that fail to parse are not manifests and are skipped.
pub fn find_manifests<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, ManifestError> {
    let dir = dir.as_ref();
    let mut found = Vec::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            ManifestError::io(path, source)
        })?;

        if !entry.file_type().is_file() || !has_yaml_extension(entry.path()) {
            continue;
        }

        match Manifest::load(entry.path()) {
            Ok(manifest) if manifest.as_mapping().contains_key("schema_uri") => {
                found.push(entry.into_path());
            }
            Ok(_) => {}
            Err(err) => debug!(path = %entry.path().display(), %err, "skipping unparseable yaml"),
        }
    }

    Ok(found)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_yaml_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}
