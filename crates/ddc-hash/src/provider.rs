//! File providers: where inventory paths and contents come from.

use crate::error::InventoryError;
use crate::scope::IntegrityScope;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A source of files for an inventory run.
pub trait FileProvider {
    /// Candidate files as `/`-separated paths relative to the root, in
    /// whatever order the provider discovers them.
    ///
    /// Every file `scope` tracks must be listed. Providers may skip parts of
    /// the tree the scope cannot reach; callers filter the result anyway.
    fn list(&self, scope: &IntegrityScope) -> Result<Vec<String>, InventoryError>;

    /// Open a file previously returned by [`FileProvider::list`].
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;
}

/// Files under a directory on disk.
///
/// Symlinks are not followed while walking. A link to a file is listed and
/// read through the link; a broken link is listed so that reading it fails.
///
/// Directories the scope cannot reach are not entered, and walk errors below
/// them are ignored.
#[derive(Debug, Clone)]
pub struct FsProvider {
    root: PathBuf,
}

impl FsProvider {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> Result<String, InventoryError> {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let mut parts = Vec::new();
        for component in rel.components() {
            let part = component.as_os_str().to_str().ok_or_else(|| {
                InventoryError::UnreadableFile {
                    path: rel.to_string_lossy().into_owned(),
                    source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
                }
            })?;
            parts.push(part);
        }
        Ok(parts.join("/"))
    }
}

impl FileProvider for FsProvider {
    fn list(&self, scope: &IntegrityScope) -> Result<Vec<String>, InventoryError> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || self
                        .relative(entry.path())
                        .map_or(true, |rel| scope.may_contain(&rel))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| self.relative(p).unwrap_or_else(|_| p.display().to_string()))
                        .unwrap_or_default();
                    if !path.is_empty() && !scope.is_match(&path) && !scope.may_contain(&path) {
                        debug!(%path, error = %e, "skipping unreadable path outside scope");
                        continue;
                    }
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("filesystem loop"));
                    return Err(InventoryError::UnreadableFile { path, source });
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                // Links to directories are not descended into.
                if let Ok(meta) = fs::metadata(entry.path()) {
                    if meta.is_dir() {
                        continue;
                    }
                }
            }
            files.push(self.relative(entry.path())?);
        }
        Ok(files)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let file = File::open(self.root.join(path))?;
        Ok(Box::new(file))
    }
}

/// An in-memory file tree for tests and dry runs.
///
/// Files are listed in insertion order, so callers control discovery order.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: Vec<(String, Option<Vec<u8>>)>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, Some(contents.into()));
        self
    }

    /// Add a file that is listed but cannot be read.
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.insert(path, None);
        self
    }

    /// Remove a file from the tree.
    pub fn without(mut self, path: &str) -> Self {
        self.files.retain(|(p, _)| p != path);
        self
    }

    fn insert(&mut self, path: &str, contents: Option<Vec<u8>>) {
        match self.files.iter_mut().find(|(p, _)| p == path) {
            Some(slot) => slot.1 = contents,
            None => self.files.push((path.to_string(), contents)),
        }
    }
}

impl FileProvider for MemoryProvider {
    fn list(&self, _scope: &IntegrityScope) -> Result<Vec<String>, InventoryError> {
        Ok(self.files.iter().map(|(p, _)| p.clone()).collect())
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.files.iter().find(|(p, _)| p == path) {
            Some((_, Some(bytes))) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            Some((_, None)) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is unreadable",
            )),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        }
    }
}
