//! Ledger and chain orchestration for hashchain.
//!
//! This crate brings the core primitives together into a working chain:
//! - **Ledger**: account balances and activity
//! - **Mempool**: transactions accepted but not yet mined
//! - **Chain**: admission, proof-of-work mining, and verification
//! - **SharedChain**: one chain behind a mutex for multiple callers
//!
//! A block production cycle moves through three steps. Transactions are
//! collected into the pending pool, a block holding them plus a reward is
//! sealed, and the sealed block is appended and applied to the ledger.
//!
//! # Example
//!
//! ```rust,no_run
//! use hashchain_chain::{Chain, ChainConfig};
//!
//! let mut chain = Chain::new(ChainConfig::default());
//! let alice = chain.create_account();
//! let bob = chain.create_account();
//!
//! chain.submit_transaction(alice, bob, 30).unwrap();
//! let block = chain.mine(alice).unwrap();
//!
//! assert_eq!(block.index, 1);
//! assert_eq!(chain.balance(&alice), 170);
//! assert_eq!(chain.balance(&bob), 130);
//! assert!(chain.verify());
//! ```

pub mod blockchain;
pub mod ledger;
pub mod mempool;
pub mod shared;

// Re-export commonly used types
pub use blockchain::{BlockInfo, Chain, ChainConfig, ChainError, ChainStats};
pub use ledger::{Ledger, LedgerError};
pub use mempool::{Mempool, MempoolConfig, MempoolError};
pub use shared::SharedChain;
