//! Binary Merkle tree over inventory entries.
//!
//! Leaves are taken in bytewise path order:
//!
//! - leaf = SHA256(0x00 ‖ path ‖ 0x00 ‖ hex digest)
//! - node = SHA256(0x01 ‖ left ‖ right)
//! - an odd node at the end of a level is paired with itself
//! - the empty set hashes to [`EMPTY_ROOT`], the SHA-256 of no bytes
//!
//! Binding the path into each leaf makes renames and moves change the root,
//! not only content edits.

use sha2::{Digest, Sha256};

/// Root of an inventory with no entries: SHA-256 of the empty string.
pub const EMPTY_ROOT: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

type Hash = [u8; 32];

/// Fold `(path, hex digest)` pairs, already sorted by path, into a root.
pub fn merkle_root<'a, I>(leaves: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut level: Vec<Hash> = leaves
        .into_iter()
        .map(|(path, digest)| leaf_hash(path, digest))
        .collect();

    if level.is_empty() {
        return hex::encode(Sha256::digest(b""));
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| node_hash(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
    }

    hex::encode(level[0])
}

fn leaf_hash(path: &str, digest: &str) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(digest.as_bytes());
    hasher.finalize().into()
}

fn node_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const D1: &str = "1111111111111111111111111111111111111111111111111111111111111111";
    const D2: &str = "2222222222222222222222222222222222222222222222222222222222222222";
    const D3: &str = "3333333333333333333333333333333333333333333333333333333333333333";

    #[test]
    fn test_empty_root_constant() {
        assert_eq!(merkle_root(Vec::<(&str, &str)>::new()), EMPTY_ROOT);
    }

    #[test]
    fn test_single_leaf_is_leaf_hash() {
        let root = merkle_root([("a", D1)]);
        assert_eq!(root, hex::encode(leaf_hash("a", D1)));
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let root = merkle_root([("a", D1), ("b", D2), ("c", D3)]);
        let left = node_hash(&leaf_hash("a", D1), &leaf_hash("b", D2));
        let right = node_hash(&leaf_hash("c", D3), &leaf_hash("c", D3));
        assert_eq!(root, hex::encode(node_hash(&left, &right)));
    }

    #[test]
    fn test_rename_changes_root() {
        let before = merkle_root([("a", D1), ("b", D2)]);
        let after = merkle_root([("a", D1), ("c", D2)]);
        assert_ne!(before, after);
    }

    #[test]
    fn test_root_is_lowercase_hex() {
        let root = merkle_root([("a", D1)]);
        assert_eq!(root.len(), 64);
        assert!(root.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
