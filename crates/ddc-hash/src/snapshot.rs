//! Persisted inventory snapshots.

use crate::error::InventoryError;
use crate::inventory::{FileEntry, HashInventory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One file in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: String,
    pub sha256: String,
    pub size: u64,
}

/// Serializable form of a [`HashInventory`] written by the aggregator and read
/// back by later validation runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub algo: String,
    pub entries: Vec<SnapshotEntry>,
    pub merkle_root: String,
    pub generated_at: DateTime<Utc>,
}

impl InventorySnapshot {
    pub fn from_inventory(inventory: &HashInventory, generated_at: DateTime<Utc>) -> Self {
        Self {
            algo: "sha256".to_string(),
            entries: inventory
                .iter()
                .map(|(path, entry)| SnapshotEntry {
                    path: path.clone(),
                    sha256: entry.sha256.clone(),
                    size: entry.size,
                })
                .collect(),
            merkle_root: inventory.merkle_root(),
            generated_at,
        }
    }

    /// Rebuild the inventory, checking that the recorded root still matches
    /// the recorded entries.
    pub fn to_inventory(&self) -> Result<HashInventory, InventoryError> {
        if self.algo != "sha256" {
            return Err(InventoryError::InvalidSnapshot(format!(
                "unsupported algorithm '{}'",
                self.algo
            )));
        }

        let mut inventory = HashInventory::new();
        for entry in &self.entries {
            if !is_hex64(&entry.sha256) {
                return Err(InventoryError::InvalidSnapshot(format!(
                    "entry {} has malformed digest",
                    entry.path
                )));
            }
            let previous = inventory.insert(
                entry.path.clone(),
                FileEntry {
                    sha256: entry.sha256.clone(),
                    size: entry.size,
                },
            );
            if previous.is_some() {
                return Err(InventoryError::InvalidSnapshot(format!(
                    "duplicate entry {}",
                    entry.path
                )));
            }
        }

        let recomputed = inventory.merkle_root();
        if recomputed != self.merkle_root {
            return Err(InventoryError::InvalidSnapshot(format!(
                "recorded merkle root {} does not match entries ({recomputed})",
                self.merkle_root
            )));
        }
        Ok(inventory)
    }

    /// Sorted-key compact JSON.
    pub fn to_json(&self) -> Result<String, InventoryError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), InventoryError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| InventoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| InventoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}

pub(crate) fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::build_inventory;
    use crate::provider::MemoryProvider;
    use crate::scope::IntegrityScope;

    fn sample() -> HashInventory {
        let provider = MemoryProvider::new()
            .with_file("core/a.py", "print('a')")
            .with_file("core/b.py", "print('b')");
        let scope = IntegrityScope::new(&["core/**"], &[]).unwrap();
        build_inventory(&provider, &scope).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("manifest/hash-inventory.json");

        let inventory = sample();
        let snapshot = InventorySnapshot::from_inventory(&inventory, Utc::now());
        snapshot.save(&file).unwrap();

        let loaded = InventorySnapshot::load(&file).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.to_inventory().unwrap(), inventory);
    }

    #[test]
    fn test_json_has_sorted_keys() {
        let snapshot = InventorySnapshot::from_inventory(&sample(), Utc::now());
        let json = snapshot.to_json().unwrap();
        let algo = json.find("\"algo\"").unwrap();
        let entries = json.find("\"entries\"").unwrap();
        let generated = json.find("\"generated_at\"").unwrap();
        let root = json.find("\"merkle_root\"").unwrap();
        assert!(algo < entries && entries < generated && generated < root);
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_tampered_snapshot_rejected() {
        let mut snapshot = InventorySnapshot::from_inventory(&sample(), Utc::now());
        snapshot.entries[0].sha256 = "0".repeat(64);
        assert!(matches!(
            snapshot.to_inventory(),
            Err(InventoryError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_malformed_digest_rejected() {
        let mut snapshot = InventorySnapshot::from_inventory(&sample(), Utc::now());
        snapshot.entries[0].sha256 = "XYZ".to_string();
        assert!(snapshot.to_inventory().is_err());
    }
}
