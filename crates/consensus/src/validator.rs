//! Block and chain integrity rules.
//!
//! Every block's digest is recomputed from its stored fields. Non-genesis
//! blocks must also meet their own stored difficulty, pay their reward to
//! their stored miner, and point at the digest of the block before them.
//! Failures are reported, never repaired.

use hashchain_core::{Block, Hash};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("chain has no genesis block")]
    MissingGenesis,

    #[error("block {index}: genesis must have index 0 and a zero previous digest")]
    InvalidGenesis { index: u64 },

    #[error("block index mismatch (expected {expected}, got {got})")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("block {index}: stored digest {stored} does not match computed {computed}")]
    DigestMismatch {
        index: u64,
        stored: Hash,
        computed: Hash,
    },

    #[error("block {index}: digest {digest} has fewer than {difficulty} leading zeros")]
    InsufficientWork {
        index: u64,
        digest: Hash,
        difficulty: u32,
    },

    #[error("block {index}: difficulty {got} differs from the chain's {expected}")]
    DifficultyMismatch { index: u64, expected: u32, got: u32 },

    #[error("block {index}: reward is not paid to the recorded miner")]
    MinerMismatch { index: u64 },

    #[error("block {index}: previous digest does not match the parent's digest")]
    BrokenLink { index: u64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Check the stored digest against one recomputed from the block's fields.
    pub fn validate_digest(block: &Block) -> Result<()> {
        let computed = block.compute_digest();
        if computed != block.digest {
            return Err(ValidationError::DigestMismatch {
                index: block.index,
                stored: block.digest,
                computed,
            });
        }
        Ok(())
    }

    /// Check the block's digest against its own difficulty. Genesis is exempt.
    pub fn validate_work(block: &Block) -> Result<()> {
        if block.is_genesis() {
            return Ok(());
        }
        if !block.meets_target() {
            return Err(ValidationError::InsufficientWork {
                index: block.index,
                digest: block.digest,
                difficulty: block.difficulty,
            });
        }
        Ok(())
    }

    /// Check that the block's closing reward goes to its recorded miner.
    /// Genesis is exempt.
    pub fn validate_miner(block: &Block) -> Result<()> {
        if block.is_genesis() {
            return Ok(());
        }
        match block.reward() {
            Some(reward) if reward.recipient == block.miner => Ok(()),
            _ => Err(ValidationError::MinerMismatch { index: block.index }),
        }
    }

    /// Check the block was sealed at the chain's fixed difficulty.
    /// Genesis is exempt.
    pub fn validate_difficulty(block: &Block, expected: u32) -> Result<()> {
        if block.is_genesis() || block.difficulty == expected {
            return Ok(());
        }
        Err(ValidationError::DifficultyMismatch {
            index: block.index,
            expected,
            got: block.difficulty,
        })
    }

    /// Validate block extends the parent correctly.
    pub fn validate_link(block: &Block, parent: &Block) -> Result<()> {
        if block.index != parent.index + 1 {
            return Err(ValidationError::InvalidIndex {
                expected: parent.index + 1,
                got: block.index,
            });
        }

        if block.previous_digest != parent.digest {
            return Err(ValidationError::BrokenLink { index: block.index });
        }

        Ok(())
    }

    /// Full block validation (digest + work + miner + parent link).
    pub fn validate_full(block: &Block, parent: &Block) -> Result<()> {
        Self::validate_digest(block)?;
        Self::validate_work(block)?;
        Self::validate_miner(block)?;
        Self::validate_link(block, parent)?;
        Ok(())
    }
}

/// Whole-chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Verify every block from genesis to tip.
    pub fn verify(blocks: &[Block]) -> Result<()> {
        let genesis = blocks.first().ok_or(ValidationError::MissingGenesis)?;
        if !genesis.is_genesis() {
            return Err(ValidationError::InvalidGenesis {
                index: genesis.index,
            });
        }
        BlockValidator::validate_digest(genesis)?;

        for pair in blocks.windows(2) {
            BlockValidator::validate_full(&pair[1], &pair[0])?;
        }

        Ok(())
    }

    /// Verify like [`ChainValidator::verify`], also requiring every mined
    /// block to carry `difficulty`.
    pub fn verify_with_difficulty(blocks: &[Block], difficulty: u32) -> Result<()> {
        for block in blocks {
            BlockValidator::validate_difficulty(block, difficulty)?;
        }
        Self::verify(blocks)
    }
}
