//! Block structure and its digest.

use crate::address::Address;
use crate::hash::{hash, Hash};
use crate::merkle::{MerkleCommitment, MerkleError};
use crate::time::unix_millis;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// The fields covered by a block's digest, in canonical order.
#[derive(Serialize)]
struct DigestFields<'a> {
    index: u64,
    timestamp: u64,
    transactions: &'a [Transaction],
    previous_digest: &'a Hash,
    nonce: u64,
}

/// A block of transactions linked to its predecessor by digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (0 for genesis).
    pub index: u64,
    /// Creation time in Unix milliseconds, captured when mining starts.
    pub timestamp: u64,
    /// Ordered transactions; the reward transaction comes last.
    pub transactions: Vec<Transaction>,
    /// Digest of the previous block.
    pub previous_digest: Hash,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Digest over the canonical encoding of the fields above.
    pub digest: Hash,
    /// Address credited with the block reward.
    pub miner: Address,
    /// Required number of leading zero hex characters in `digest`.
    pub difficulty: u32,
}

impl Block {
    /// Create an unsealed block with nonce 0 and a provisional digest.
    pub fn new(
        index: u64,
        previous_digest: Hash,
        transactions: Vec<Transaction>,
        miner: Address,
        difficulty: u32,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: unix_millis(),
            transactions,
            previous_digest,
            nonce: 0,
            digest: Hash::ZERO,
            miner,
            difficulty,
        };
        block.digest = block.compute_digest();
        block
    }

    /// Create the genesis block. Its digest is not held to any work target.
    pub fn genesis() -> Self {
        Self::new(0, Hash::ZERO, Vec::new(), Address::SYSTEM, 0)
    }

    /// Canonical encoding of every digest-covered field.
    pub fn encode_for_digest(&self) -> Vec<u8> {
        let fields = DigestFields {
            index: self.index,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            previous_digest: &self.previous_digest,
            nonce: self.nonce,
        };
        bincode::serialize(&fields).expect("serialization should not fail")
    }

    /// Recompute the digest from the stored fields.
    pub fn compute_digest(&self) -> Hash {
        hash(&self.encode_for_digest())
    }

    /// Set the nonce and refresh the digest.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.digest = self.compute_digest();
    }

    /// Check that the stored digest matches the stored fields.
    pub fn has_valid_digest(&self) -> bool {
        self.compute_digest() == self.digest
    }

    /// Check whether the stored digest satisfies the block's difficulty.
    pub fn meets_target(&self) -> bool {
        self.digest.meets_difficulty(self.difficulty)
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_digest == Hash::ZERO
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Encoded size of the transaction list in bytes.
    pub fn size(&self) -> usize {
        bincode::serialized_size(&self.transactions).map_or(0, |n| n as usize)
    }

    /// The reward transaction, if the block carries one.
    pub fn reward(&self) -> Option<&Transaction> {
        self.transactions.last().filter(|tx| tx.is_reward())
    }

    /// Merkle commitment over the block's transactions.
    pub fn transactions_commitment(&self) -> Result<MerkleCommitment, MerkleError> {
        let records: Vec<Vec<u8>> = self.transactions.iter().map(Transaction::encode).collect();
        MerkleCommitment::build(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        let from = Address::from_bytes([1u8; 20]);
        let to = Address::from_bytes([2u8; 20]);
        let txs = vec![
            Transaction::transfer(from, to, 30),
            Transaction::reward(from, 100),
        ];
        Block::new(1, hash(b"parent"), txs, from, 2)
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_digest, Hash::ZERO);
        assert_eq!(genesis.previous_digest.to_hex(), "0".repeat(64));
        assert_eq!(genesis.miner, Address::SYSTEM);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.has_valid_digest());
    }

    #[test]
    fn test_new_block_provisional_digest() {
        let block = sample_block();
        assert_eq!(block.nonce, 0);
        assert!(block.has_valid_digest());
        assert_eq!(block.difficulty, 2);
    }

    #[test]
    fn test_block_hash_deterministic() {
        let block = sample_block();
        assert_eq!(block.compute_digest(), block.compute_digest());
    }

    #[test]
    fn test_set_nonce_refreshes_digest() {
        let mut block = sample_block();
        let before = block.digest;
        block.set_nonce(7);
        assert_ne!(block.digest, before);
        assert!(block.has_valid_digest());
    }

    #[test]
    fn test_tampering_breaks_digest() {
        let mut block = sample_block();
        block.transactions[0].amount = 31;
        assert!(!block.has_valid_digest());
    }

    #[test]
    fn test_miner_and_difficulty_outside_digest() {
        let mut block = sample_block();
        let digest = block.compute_digest();
        block.miner = Address::from_bytes([9u8; 20]);
        block.difficulty = 5;
        assert_eq!(block.compute_digest(), digest);
    }

    #[test]
    fn test_reward_is_last() {
        let block = sample_block();
        let reward = block.reward().unwrap();
        assert_eq!(reward.amount, 100);
        assert!(Block::genesis().reward().is_none());
    }

    #[test]
    fn test_transactions_commitment() {
        let block = sample_block();
        let tree = block.transactions_commitment().unwrap();
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.leaves()[0], block.transactions[0].hash());

        assert_eq!(
            Block::genesis().transactions_commitment(),
            Err(MerkleError::EmptyInput)
        );
    }

    #[test]
    fn test_size_grows_with_transactions() {
        assert!(sample_block().size() > Block::genesis().size());
    }
}
