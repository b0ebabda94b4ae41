//! Value transfers between accounts.

use crate::address::Address;
use crate::hash::{hash, Hash};
use crate::time::unix_millis;
use serde::{Deserialize, Serialize};

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Reward transactions use [`Address::SYSTEM`] as the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address.
    pub sender: Address,
    /// Recipient's address.
    pub recipient: Address,
    /// Value to transfer.
    pub amount: u64,
    /// Creation time in Unix milliseconds.
    pub timestamp: u64,
}

impl Transaction {
    /// Create a transaction with an explicit timestamp.
    pub fn new(sender: Address, recipient: Address, amount: u64, timestamp: u64) -> Self {
        Self {
            sender,
            recipient,
            amount,
            timestamp,
        }
    }

    /// Create a value transfer stamped with the current time.
    pub fn transfer(sender: Address, recipient: Address, amount: u64) -> Self {
        Self::new(sender, recipient, amount, unix_millis())
    }

    /// Create a mining reward paid by the system address.
    pub fn reward(miner: Address, amount: u64) -> Self {
        Self::new(Address::SYSTEM, miner, amount, unix_millis())
    }

    /// Check if this transaction issues a mining reward.
    pub fn is_reward(&self) -> bool {
        self.sender.is_system()
    }

    /// Canonical byte encoding, used as the Merkle leaf record.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("serialization should not fail")
    }

    /// Get the transaction hash.
    pub fn hash(&self) -> Hash {
        hash(&self.encode())
    }
}
