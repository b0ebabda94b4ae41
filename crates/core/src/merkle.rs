//! Merkle commitments over ordered records.
//!
//! The tree is built bottom-up. Whenever a level holds an odd number of
//! digests (and more than one), its last digest is paired with itself. This
//! applies at every level, not just the leaves: 11 leaves pair as 12, the
//! resulting 6 nodes pair evenly, and the 3 above them pair as 4.

use crate::hash::{hash, hash_concat, Hash};
use thiserror::Error;

/// Errors that can occur while building a commitment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a merkle commitment from zero records")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Combine two child digests into their parent.
pub fn combine(left: &Hash, right: &Hash) -> Hash {
    hash_concat(&[left.as_ref(), right.as_ref()])
}

/// Build the level above `level`, pairing the last digest with itself when odd.
fn parent_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => combine(left, right),
            [last] => combine(last, last),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// A binary hash tree over an ordered list of records.
///
/// Immutable once built. Level 0 holds one digest per record, in input order;
/// the last level holds only the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleCommitment {
    levels: Vec<Vec<Hash>>,
    root: Hash,
}

/// A merkle proof for a single leaf.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    /// The leaf being proven.
    pub leaf: Hash,
    /// Sibling hashes from leaf to root.
    pub siblings: Vec<Hash>,
    /// Direction for each sibling (true = right, false = left).
    pub directions: Vec<bool>,
}

impl MerkleCommitment {
    /// Hash each record into a leaf and build the tree over them.
    pub fn build<R: AsRef<[u8]>>(records: &[R]) -> Result<Self> {
        let leaves: Vec<Hash> = records.iter().map(|r| hash(r.as_ref())).collect();
        Self::from_leaves(&leaves)
    }

    /// Build the tree over already-hashed leaves.
    pub fn from_leaves(leaves: &[Hash]) -> Result<Self> {
        let root_seed = *leaves.first().ok_or(MerkleError::EmptyInput)?;

        let mut levels = vec![leaves.to_vec()];
        while let Some(next) = levels
            .last()
            .filter(|level| level.len() > 1)
            .map(|level| parent_level(level))
        {
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(root_seed);

        Ok(Self { levels, root })
    }

    /// The root digest.
    pub fn root(&self) -> Hash {
        self.root
    }

    /// The digests at level `index` (0 = leaves), without padding.
    pub fn level(&self, index: usize) -> Option<&[Hash]> {
        self.levels.get(index).map(Vec::as_slice)
    }

    /// The digests at level `index` as they are paired, with the last digest
    /// duplicated when the level is odd and not the root.
    pub fn padded_level(&self, index: usize) -> Option<Vec<Hash>> {
        let level = self.levels.get(index)?;
        let mut padded = level.clone();
        if level.len() > 1 && level.len() % 2 == 1 {
            padded.push(level[level.len() - 1]);
        }
        Some(padded)
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<Hash>] {
        &self.levels
    }

    /// The leaf digests.
    pub fn leaves(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Number of levels including the leaves and the root.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Get the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let leaf = self.levels[0][index];
        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 0;
            let sibling_idx = if is_right { idx + 1 } else { idx - 1 };

            // Past the end means this node was paired with itself.
            let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);

            siblings.push(sibling);
            directions.push(is_right);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            siblings,
            directions,
        })
    }

    /// Verify a merkle proof against this tree's root.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.root, proof)
    }
}

/// Verify a merkle proof against a given root.
pub fn verify_proof(root: &Hash, proof: &MerkleProof) -> bool {
    let mut current = proof.leaf;

    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        current = if *is_right {
            combine(&current, sibling)
        } else {
            combine(sibling, &current)
        };
    }

    current == *root
}
