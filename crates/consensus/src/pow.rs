//! Proof-of-work sealing.
//!
//! A block is sealed by trying nonces 0, 1, 2, ... and recomputing its digest
//! until the hex form of the digest starts with `difficulty` zero characters.
//! The search has no upper bound; callers stop it through a [`CancelToken`].
//! Expected cost is 16^difficulty attempts.

use hashchain_core::{hash_concat, Block, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur before a nonce search starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("prefix {0:?} is not lowercase hexadecimal")]
    InvalidPrefix(String),
}

pub type Result<T> = std::result::Result<T, PowError>;

/// Shared flag a caller sets to stop a running search.
///
/// Clones observe the same flag, so one clone can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that any search observing this token stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters from a successful seal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealStats {
    /// Number of digests computed, including the successful one.
    pub attempts: u64,
    /// Wall time spent searching.
    pub elapsed: Duration,
}

/// Proof-of-work with a fixed difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Seal `block`, returning `None` if `cancel` fires first.
    pub fn seal(&self, block: Block, cancel: &CancelToken) -> Option<Block> {
        self.seal_with_stats(block, cancel).map(|(block, _)| block)
    }

    /// Seal `block` and report how much work it took.
    ///
    /// The block's difficulty is set to this instance's difficulty. The first
    /// satisfying nonce in ascending order from 0 is kept.
    pub fn seal_with_stats(
        &self,
        mut block: Block,
        cancel: &CancelToken,
    ) -> Option<(Block, SealStats)> {
        let started = Instant::now();
        block.difficulty = self.difficulty;

        let mut nonce = 0u64;
        loop {
            if cancel.is_cancelled() {
                warn!(index = block.index, attempts = nonce, "sealing cancelled");
                return None;
            }

            block.set_nonce(nonce);
            if block.meets_target() {
                let stats = SealStats {
                    attempts: nonce + 1,
                    elapsed: started.elapsed(),
                };
                debug!(
                    index = block.index,
                    nonce,
                    attempts = stats.attempts,
                    elapsed_ms = stats.elapsed.as_millis() as u64,
                    "block sealed"
                );
                return Some((block, stats));
            }

            nonce = nonce.wrapping_add(1);
        }
    }

    /// Check that a block's stored digest is both current and meets this difficulty.
    pub fn verify(&self, block: &Block) -> bool {
        block.has_valid_digest() && block.digest.meets_difficulty(self.difficulty)
    }
}

/// A nonce found for arbitrary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceSolution {
    pub nonce: u64,
    pub digest: Hash,
    pub elapsed: Duration,
}

/// Digest of `data` followed by the decimal form of `nonce`.
pub fn nonce_digest(data: &[u8], nonce: u64) -> Hash {
    hash_concat(&[data, nonce.to_string().as_bytes()])
}

/// Search for the smallest nonce whose [`nonce_digest`] hex starts with `prefix`.
///
/// Returns `Ok(None)` if cancelled.
pub fn find_nonce(
    data: &[u8],
    prefix: &str,
    cancel: &CancelToken,
) -> Result<Option<NonceSolution>> {
    let valid = prefix.len() <= 64
        && prefix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if !valid {
        return Err(PowError::InvalidPrefix(prefix.to_string()));
    }

    let started = Instant::now();
    let mut nonce = 0u64;
    loop {
        if cancel.is_cancelled() {
            warn!(prefix, attempts = nonce, "nonce search cancelled");
            return Ok(None);
        }

        let digest = nonce_digest(data, nonce);
        if digest.to_hex().starts_with(prefix) {
            return Ok(Some(NonceSolution {
                nonce,
                digest,
                elapsed: started.elapsed(),
            }));
        }

        nonce = nonce.wrapping_add(1);
    }
}
