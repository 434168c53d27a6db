//! Hash inventory construction.

use crate::error::InventoryError;
use crate::merkle;
use crate::provider::FileProvider;
use crate::scope::IntegrityScope;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};
use tracing::{debug, info};

const CHUNK_SIZE: usize = 1 << 20;

/// Digest and size of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Lowercase hex SHA-256 of the file bytes
    pub sha256: String,
    pub size: u64,
}

/// Mapping from relative path to file digest, ordered bytewise by path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HashInventory {
    entries: BTreeMap<String, FileEntry>,
}

/// Paths that differ between two inventories.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InventoryDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl InventoryDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

impl HashInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: FileEntry) -> Option<FileEntry> {
        self.entries.insert(path.into(), entry)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The Merkle root over all entries.
    pub fn merkle_root(&self) -> String {
        merkle::merkle_root(
            self.entries
                .iter()
                .map(|(path, entry)| (path.as_str(), entry.sha256.as_str())),
        )
    }

    /// What changed going from `self` (the baseline) to `current`.
    pub fn diff(&self, current: &HashInventory) -> InventoryDiff {
        let mut diff = InventoryDiff::default();
        for (path, entry) in &current.entries {
            match self.entries.get(path) {
                None => diff.added.push(path.clone()),
                Some(old) if old != entry => diff.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        diff.removed = self
            .entries
            .keys()
            .filter(|path| !current.entries.contains_key(*path))
            .cloned()
            .collect();
        diff
    }
}

/// The tracked paths: every listed file inside `scope`, sorted bytewise.
pub fn discover<P: FileProvider + ?Sized>(
    provider: &P,
    scope: &IntegrityScope,
) -> Result<Vec<String>, InventoryError> {
    let mut paths: Vec<String> = provider
        .list(scope)?
        .into_iter()
        .filter(|path| scope.is_match(path))
        .collect();
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Hash every tracked file.
///
/// Stops at the first file that cannot be read; a partial inventory is never
/// returned.
pub fn build_inventory<P: FileProvider + ?Sized>(
    provider: &P,
    scope: &IntegrityScope,
) -> Result<HashInventory, InventoryError> {
    let paths = discover(provider, scope)?;
    debug!(files = paths.len(), "hashing integrity scope");

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut inventory = HashInventory::new();
    for path in paths {
        let entry = hash_file(provider, &path, &mut buffer)?;
        inventory.insert(path, entry);
    }

    info!(
        files = inventory.len(),
        merkle_root = %inventory.merkle_root(),
        "hash inventory complete"
    );
    Ok(inventory)
}

fn hash_file<P: FileProvider + ?Sized>(
    provider: &P,
    path: &str,
    buffer: &mut [u8],
) -> Result<FileEntry, InventoryError> {
    let unreadable = |source| InventoryError::UnreadableFile {
        path: path.to_string(),
        source,
    };

    let mut reader = provider.open(path).map_err(unreadable)?;
    let mut hasher = Sha256::new();
    let mut size = 0u64;
    loop {
        let read = match reader.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(unreadable(e)),
        };
        hasher.update(&buffer[..read]);
        size += read as u64;
    }

    Ok(FileEntry {
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}
