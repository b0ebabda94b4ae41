//! Account state representation.

use crate::address::Address;
use crate::time::unix_millis;
use serde::{Deserialize, Serialize};

/// An account held by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account's address.
    pub address: Address,
    /// Account balance in the native token.
    pub balance: u64,
    /// Number of applied transactions touching this account.
    pub transaction_count: u64,
    /// Creation time in Unix milliseconds.
    pub created_at: u64,
    /// Last activity in Unix milliseconds.
    pub last_active: u64,
}

impl Account {
    /// Create an account holding `balance`.
    pub fn new(address: Address, balance: u64) -> Self {
        let now = unix_millis();
        Self {
            address,
            balance,
            transaction_count: 0,
            created_at: now,
            last_active: now,
        }
    }

    /// Add balance to the account.
    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Subtract balance from the account.
    /// Returns true if successful, false if insufficient balance.
    pub fn debit(&mut self, amount: u64) -> bool {
        if self.balance >= amount {
            self.balance -= amount;
            true
        } else {
            false
        }
    }

    /// Check if the account has sufficient balance.
    pub fn has_balance(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Mark the account as active now.
    pub fn touch(&mut self) {
        self.last_active = self.last_active.max(unix_millis());
    }

    /// Count a transaction against this account and mark it active.
    pub fn record_transaction(&mut self) {
        self.transaction_count = self.transaction_count.saturating_add(1);
        self.touch();
    }
}
