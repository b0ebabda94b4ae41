//! Core primitives for hashchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Hashing (the single digest function used for leaves, nodes, and blocks)
//! - Addresses and timestamps
//! - Merkle commitments over ordered records
//! - Transactions and accounts
//! - Blocks

pub mod account;
pub mod address;
pub mod block;
pub mod hash;
pub mod merkle;
pub mod time;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use account::Account;
pub use address::{Address, AddressError};
pub use block::Block;
pub use hash::{hash, hash_concat, Hash, H256};
pub use merkle::{verify_proof, MerkleCommitment, MerkleError, MerkleProof};
pub use time::unix_millis;
pub use transaction::Transaction;
