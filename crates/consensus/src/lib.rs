//! Proof-of-work consensus for hashchain.
//!
//! This crate provides:
//! - Block sealing by ascending nonce search against a leading-zero target
//! - A cancellation token so a caller can abort a long search
//! - Block and whole-chain integrity checks (digest, work, miner, links)
//!
//! # Example
//!
//! ```rust,no_run
//! use hashchain_consensus::{CancelToken, ChainValidator, ProofOfWork};
//! use hashchain_core::{Address, Block, Transaction};
//!
//! let genesis = Block::genesis();
//! let miner = Address::generate();
//!
//! // Seal a block on top of genesis
//! let pow = ProofOfWork::new(3);
//! let reward = vec![Transaction::reward(miner, 100)];
//! let block = Block::new(1, genesis.digest, reward, miner, pow.difficulty());
//! let sealed = pow.seal(block, &CancelToken::new()).unwrap();
//!
//! // Verify the resulting chain
//! ChainValidator::verify_with_difficulty(&[genesis, sealed], 3).unwrap();
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{find_nonce, CancelToken, NonceSolution, PowError, ProofOfWork, SealStats};
pub use validator::{BlockValidator, ChainValidator, ValidationError};
