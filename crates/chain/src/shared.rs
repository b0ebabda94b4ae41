//! A chain shared between callers.
//!
//! Mining reads the pending pool and later writes blocks, ledger, and pool as
//! one step, so every mutating call takes the same lock for its full duration.

use crate::blockchain::{BlockInfo, Chain, ChainStats, Result};
use hashchain_consensus::CancelToken;
use hashchain_core::{Account, Address, Block};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a [`Chain`] behind a single mutex.
#[derive(Debug, Clone)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    pub fn create_account(&self) -> Address {
        self.inner.lock().create_account()
    }

    pub fn submit_transaction(
        &self,
        sender: Address,
        recipient: Address,
        amount: u64,
    ) -> Result<()> {
        self.inner.lock().submit_transaction(sender, recipient, amount)
    }

    /// Mine while holding the lock. Other callers wait until the block is
    /// sealed or `cancel` fires.
    pub fn mine_with_cancel(&self, miner: Address, cancel: &CancelToken) -> Result<Block> {
        self.inner.lock().mine_with_cancel(miner, cancel)
    }

    pub fn mine(&self, miner: Address) -> Result<Block> {
        self.inner.lock().mine(miner)
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.inner.lock().balance(address)
    }

    pub fn account_info(&self, address: &Address) -> Option<Account> {
        self.inner.lock().account_info(address)
    }

    pub fn block_info(&self, index: u64) -> Option<BlockInfo> {
        self.inner.lock().block_info(index)
    }

    pub fn verify(&self) -> bool {
        self.inner.lock().verify()
    }

    pub fn stats(&self) -> ChainStats {
        self.inner.lock().stats()
    }

    /// Run a read-only closure against the chain under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        let chain = self.inner.lock();
        f(&chain)
    }
}
