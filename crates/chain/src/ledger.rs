//! Account ledger.
//!
//! Value only enters the ledger through account creation (the starting
//! balance) and reward transactions. Transfers move it between accounts.

use hashchain_core::{Account, Address, Transaction};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when checking or applying a transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown account: {0}")]
    UnknownAccount(Address),

    #[error("insufficient balance: address {address}, required {required}, available {available}")]
    InsufficientBalance {
        address: Address,
        required: u64,
        available: u64,
    },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Mapping of address to account, with accounts kept in creation order.
#[derive(Debug, Clone)]
pub struct Ledger {
    accounts: HashMap<Address, Account>,
    creation_order: Vec<Address>,
    starting_balance: u64,
}

impl Ledger {
    /// Create an empty ledger granting `starting_balance` to each new account.
    pub fn new(starting_balance: u64) -> Self {
        Self {
            accounts: HashMap::new(),
            creation_order: Vec::new(),
            starting_balance,
        }
    }

    /// Allocate a fresh address holding the starting balance.
    pub fn create_account(&mut self) -> Address {
        let mut address = Address::generate();
        while address.is_system() || self.accounts.contains_key(&address) {
            address = Address::generate();
        }

        self.accounts
            .insert(address, Account::new(address, self.starting_balance));
        self.creation_order.push(address);

        info!(%address, balance = self.starting_balance, "account created");
        address
    }

    /// Check if an account exists.
    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Balance of `address`, or 0 if it is unknown.
    pub fn balance(&self, address: &Address) -> u64 {
        self.accounts.get(address).map_or(0, |a| a.balance)
    }

    /// Get an account by address.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Snapshot of an account's balance and activity.
    pub fn account_info(&self, address: &Address) -> Option<Account> {
        self.accounts.get(address).cloned()
    }

    /// Accounts in creation order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.creation_order
            .iter()
            .filter_map(|address| self.accounts.get(address))
    }

    /// Number of accounts ever created.
    pub fn accounts_created(&self) -> usize {
        self.creation_order.len()
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> u64 {
        self.accounts.values().map(|a| a.balance).sum()
    }

    pub fn starting_balance(&self) -> u64 {
        self.starting_balance
    }

    /// Record activity on an account without a transaction.
    /// Returns false if the account is unknown.
    pub fn touch(&mut self, address: &Address) -> bool {
        match self.accounts.get_mut(address) {
            Some(account) => {
                account.touch();
                true
            }
            None => false,
        }
    }

    /// Check that both parties exist and the sender can cover `amount`.
    pub fn check_transaction(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: u64,
    ) -> Result<()> {
        let sender_account = self
            .accounts
            .get(sender)
            .ok_or(LedgerError::UnknownAccount(*sender))?;

        if !self.contains(recipient) {
            return Err(LedgerError::UnknownAccount(*recipient));
        }

        if !sender_account.has_balance(amount) {
            return Err(LedgerError::InsufficientBalance {
                address: *sender,
                required: amount,
                available: sender_account.balance,
            });
        }

        Ok(())
    }

    /// True iff both parties exist and the sender's balance covers `amount`.
    pub fn validate_transaction(&self, sender: &Address, recipient: &Address, amount: u64) -> bool {
        self.check_transaction(sender, recipient, amount).is_ok()
    }

    /// Move `tx.amount` from sender to recipient.
    ///
    /// Reward transactions credit the recipient without debiting anyone. The
    /// ledger is left unchanged when an error is returned.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<()> {
        if tx.is_reward() {
            let recipient = self
                .accounts
                .get_mut(&tx.recipient)
                .ok_or(LedgerError::UnknownAccount(tx.recipient))?;
            recipient.credit(tx.amount);
            recipient.record_transaction();
            return Ok(());
        }

        self.check_transaction(&tx.sender, &tx.recipient, tx.amount)?;

        if let Some(sender) = self.accounts.get_mut(&tx.sender) {
            sender.debit(tx.amount);
            sender.record_transaction();
        }
        if let Some(recipient) = self.accounts.get_mut(&tx.recipient) {
            recipient.credit(tx.amount);
            if tx.recipient != tx.sender {
                recipient.record_transaction();
            }
        }

        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Ledger, Address, Address) {
        let mut ledger = Ledger::new(100);
        let a = ledger.create_account();
        let b = ledger.create_account();
        (ledger, a, b)
    }

    #[test]
    fn test_create_account() {
        let (ledger, a, b) = setup();
        assert_ne!(a, b);
        assert_eq!(ledger.balance(&a), 100);
        assert_eq!(ledger.balance(&b), 100);
        assert_eq!(ledger.accounts_created(), 2);
        assert_eq!(ledger.total_supply(), 200);
    }

    #[test]
    fn test_accounts_in_creation_order() {
        let (ledger, a, b) = setup();
        let order: Vec<Address> = ledger.accounts().map(|acc| acc.address).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_unknown_balance_is_zero() {
        let (ledger, _, _) = setup();
        assert_eq!(ledger.balance(&Address::from_bytes([9u8; 20])), 0);
        assert!(ledger.account_info(&Address::from_bytes([9u8; 20])).is_none());
    }

    #[test]
    fn test_validate_transaction() {
        let (ledger, a, b) = setup();
        let stranger = Address::from_bytes([9u8; 20]);

        assert!(ledger.validate_transaction(&a, &b, 30));
        assert!(ledger.validate_transaction(&a, &b, 100));
        assert!(!ledger.validate_transaction(&a, &b, 101));
        assert!(!ledger.validate_transaction(&a, &stranger, 10));
        assert!(!ledger.validate_transaction(&stranger, &a, 0));
    }

    #[test]
    fn test_check_transaction_reasons() {
        let (ledger, a, b) = setup();
        let stranger = Address::from_bytes([9u8; 20]);

        assert_eq!(
            ledger.check_transaction(&a, &stranger, 10),
            Err(LedgerError::UnknownAccount(stranger))
        );
        assert_eq!(
            ledger.check_transaction(&a, &b, 150),
            Err(LedgerError::InsufficientBalance {
                address: a,
                required: 150,
                available: 100,
            })
        );
    }

    #[test]
    fn test_apply_transfer() {
        let (mut ledger, a, b) = setup();
        ledger
            .apply_transaction(&Transaction::transfer(a, b, 30))
            .unwrap();

        assert_eq!(ledger.balance(&a), 70);
        assert_eq!(ledger.balance(&b), 130);
        assert_eq!(ledger.account(&a).unwrap().transaction_count, 1);
        assert_eq!(ledger.account(&b).unwrap().transaction_count, 1);
        assert_eq!(ledger.total_supply(), 200);
    }

    #[test]
    fn test_apply_reward() {
        let (mut ledger, a, _) = setup();
        ledger.apply_transaction(&Transaction::reward(a, 100)).unwrap();

        assert_eq!(ledger.balance(&a), 200);
        assert_eq!(ledger.account(&a).unwrap().transaction_count, 1);
        assert_eq!(ledger.total_supply(), 300);
    }

    #[test]
    fn test_apply_rejects_overdraft_without_change() {
        let (mut ledger, a, b) = setup();
        let result = ledger.apply_transaction(&Transaction::transfer(a, b, 500));

        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance(&a), 100);
        assert_eq!(ledger.balance(&b), 100);
        assert_eq!(ledger.account(&a).unwrap().transaction_count, 0);
    }

    #[test]
    fn test_self_transfer() {
        let (mut ledger, a, _) = setup();
        ledger
            .apply_transaction(&Transaction::transfer(a, a, 40))
            .unwrap();

        assert_eq!(ledger.balance(&a), 100);
        assert_eq!(ledger.account(&a).unwrap().transaction_count, 1);
    }

    #[test]
    fn test_touch() {
        let (mut ledger, a, _) = setup();
        let before = ledger.account(&a).unwrap().last_active;

        assert!(ledger.touch(&a));
        assert!(ledger.account(&a).unwrap().last_active >= before);
        assert!(!ledger.touch(&Address::from_bytes([9u8; 20])));
    }
}
