//! Pending transaction pool.
//!
//! The pool stores accepted transactions, in submission order, until they are
//! packaged into the next mined block.

use hashchain_core::{Address, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during mempool operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("mempool is full (capacity: {0})")]
    MempoolFull(usize),
}

pub type Result<T> = std::result::Result<T, MempoolError>;

/// Configuration for the mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Maximum number of transactions waiting to be mined.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
        }
    }
}

/// Transaction mempool.
#[derive(Debug, Clone)]
pub struct Mempool {
    /// Configuration.
    config: MempoolConfig,
    /// Transactions in submission order.
    transactions: Vec<Transaction>,
    /// Total pending amount sent by each address.
    outflow: HashMap<Address, u64>,
}

impl Mempool {
    /// Create a new mempool with default configuration.
    pub fn new() -> Self {
        Self::with_config(MempoolConfig::default())
    }

    /// Create a new mempool with the given configuration.
    pub fn with_config(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: Vec::new(),
            outflow: HashMap::new(),
        }
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction to the pool.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        if self.transactions.len() >= self.config.max_transactions {
            return Err(MempoolError::MempoolFull(self.config.max_transactions));
        }

        let pending = self.outflow.entry(tx.sender).or_default();
        *pending = pending.saturating_add(tx.amount);
        self.transactions.push(tx);

        Ok(())
    }

    /// Amount `sender` has already committed to pending transactions.
    pub fn pending_outflow(&self, sender: &Address) -> u64 {
        self.outflow.get(sender).copied().unwrap_or(0)
    }

    /// Pending transactions in submission order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Clear all transactions from the mempool.
    pub fn clear(&mut self) {
        self.transactions.clear();
        self.outflow.clear();
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_mempool_keeps_order() {
        let mut mempool = Mempool::new();
        let tx1 = Transaction::new(addr(1), addr(2), 10, 1);
        let tx2 = Transaction::new(addr(2), addr(1), 20, 2);
        let tx3 = Transaction::new(addr(1), addr(3), 30, 3);

        mempool.add(tx1.clone()).unwrap();
        mempool.add(tx2.clone()).unwrap();
        mempool.add(tx3.clone()).unwrap();

        assert_eq!(mempool.transactions(), &[tx1, tx2, tx3]);
    }

    #[test]
    fn test_identical_transactions_both_kept() {
        let mut mempool = Mempool::new();
        let tx = Transaction::new(addr(1), addr(2), 10, 1);

        mempool.add(tx.clone()).unwrap();
        mempool.add(tx).unwrap();

        assert_eq!(mempool.len(), 2);
        assert_eq!(mempool.pending_outflow(&addr(1)), 20);
    }

    #[test]
    fn test_pending_outflow() {
        let mut mempool = Mempool::new();
        mempool.add(Transaction::new(addr(1), addr(2), 10, 1)).unwrap();
        mempool.add(Transaction::new(addr(1), addr(3), 15, 2)).unwrap();
        mempool.add(Transaction::new(addr(2), addr(1), 7, 3)).unwrap();

        assert_eq!(mempool.pending_outflow(&addr(1)), 25);
        assert_eq!(mempool.pending_outflow(&addr(2)), 7);
        assert_eq!(mempool.pending_outflow(&addr(3)), 0);
    }

    #[test]
    fn test_mempool_capacity_limit() {
        let mut mempool = Mempool::with_config(MempoolConfig {
            max_transactions: 2,
        });

        assert!(mempool.add(Transaction::new(addr(1), addr(2), 1, 1)).is_ok());
        assert!(mempool.add(Transaction::new(addr(1), addr(2), 2, 2)).is_ok());
        assert_eq!(
            mempool.add(Transaction::new(addr(1), addr(2), 3, 3)),
            Err(MempoolError::MempoolFull(2))
        );
        assert_eq!(mempool.pending_outflow(&addr(1)), 3);
    }

    #[test]
    fn test_mempool_clear() {
        let mut mempool = Mempool::new();
        mempool.add(Transaction::new(addr(1), addr(2), 10, 1)).unwrap();

        mempool.clear();
        assert!(mempool.is_empty());
        assert_eq!(mempool.pending_outflow(&addr(1)), 0);
    }
}
