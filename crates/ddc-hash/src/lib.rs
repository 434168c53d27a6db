//! File inventory hashing and Merkle-root aggregation.
//!
//! An inventory run lists files through a [`FileProvider`], keeps the ones an
//! [`IntegrityScope`] tracks, hashes each with SHA-256 and folds the results
//! into a single root. Discovery order never affects the root: paths are
//! sorted before aggregation.
//!
//! # Example
//!
//! ```
//! use ddc_hash::{build_inventory, IntegrityScope, MemoryProvider, EMPTY_ROOT};
//!
//! let scope = IntegrityScope::new(&["core/**"], &[]).unwrap();
//! let provider = MemoryProvider::new().with_file("core/main.py", "print('hi')");
//!
//! let inventory = build_inventory(&provider, &scope).unwrap();
//! assert_eq!(inventory.len(), 1);
//! assert_ne!(inventory.merkle_root(), EMPTY_ROOT);
//! ```

mod error;
mod inventory;
mod merkle;
mod provider;
mod scope;
mod snapshot;

pub use error::InventoryError;
pub use inventory::{build_inventory, discover, FileEntry, HashInventory, InventoryDiff};
pub use merkle::{merkle_root, EMPTY_ROOT};
pub use provider::{FileProvider, FsProvider, MemoryProvider};
pub use scope::{IntegrityScope, DEFAULT_EXCLUDES, DEFAULT_INCLUDES};
pub use snapshot::{InventorySnapshot, SnapshotEntry};
