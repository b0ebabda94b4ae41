//! Main chain orchestration.
//!
//! This module ties the ledger, the pending pool, and proof-of-work together.
//! State changes only when a block has been fully sealed, so an aborted mine
//! leaves the chain exactly as it was.

use crate::ledger::{Ledger, LedgerError};
use crate::mempool::{Mempool, MempoolConfig, MempoolError};
use hashchain_consensus::{CancelToken, ChainValidator, ProofOfWork, ValidationError};
use hashchain_core::{Account, Address, Block, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] LedgerError),

    #[error("mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("unknown miner account: {0}")]
    UnknownMiner(Address),

    #[error("mining cancelled")]
    MiningCancelled,
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading zero hex characters required of every mined block.
    pub difficulty: u32,
    /// Amount paid to the miner of each block.
    pub mining_reward: u64,
    /// Balance granted to every new account.
    pub starting_balance: u64,
    /// Pending pool limits.
    pub mempool: MempoolConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: 4,
            mining_reward: 100,
            starting_balance: 100,
            mempool: MempoolConfig::default(),
        }
    }
}

/// A hash-linked chain of proof-of-work blocks with its account ledger.
#[derive(Debug)]
pub struct Chain {
    /// Blocks from genesis to tip.
    blocks: Vec<Block>,
    /// Transactions waiting for the next block.
    mempool: Mempool,
    /// Account balances.
    ledger: Ledger,
    /// Sealing rule for new blocks.
    pow: ProofOfWork,
    /// Configuration.
    config: ChainConfig,
    /// Blocks mined since genesis.
    blocks_mined: u64,
}

impl Chain {
    /// Create a chain holding only the genesis block.
    pub fn new(config: ChainConfig) -> Self {
        let genesis = Block::genesis();
        info!(
            digest = %genesis.digest,
            difficulty = config.difficulty,
            "initializing chain with genesis block"
        );

        Self {
            blocks: vec![genesis],
            mempool: Mempool::with_config(config.mempool.clone()),
            ledger: Ledger::new(config.starting_balance),
            pow: ProofOfWork::new(config.difficulty),
            config,
            blocks_mined: 0,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Get the current chain height (index of the tip).
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    /// Get the latest block.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get a block by index.
    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Display-oriented summary of a block.
    pub fn block_info(&self, index: u64) -> Option<BlockInfo> {
        self.block(index).map(BlockInfo::from)
    }

    /// Read-only view of the ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Open a new account with the starting balance.
    pub fn create_account(&mut self) -> Address {
        self.ledger.create_account()
    }

    /// Balance of `address`, or 0 if it is unknown.
    pub fn balance(&self, address: &Address) -> u64 {
        self.ledger.balance(address)
    }

    pub fn account_info(&self, address: &Address) -> Option<Account> {
        self.ledger.account_info(address)
    }

    /// Record activity on an account. Returns false if it is unknown.
    pub fn touch(&mut self, address: &Address) -> bool {
        self.ledger.touch(address)
    }

    /// Transactions waiting for the next block, in submission order.
    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.transactions()
    }

    /// Validate a transfer against the ledger and queue it for the next block.
    ///
    /// The sender must cover `amount` on top of whatever it already has
    /// pending. Rejected submissions leave the chain unchanged.
    pub fn submit_transaction(
        &mut self,
        sender: Address,
        recipient: Address,
        amount: u64,
    ) -> Result<()> {
        let committed = self.mempool.pending_outflow(&sender);
        let required = amount.saturating_add(committed);

        if let Err(err) = self.ledger.check_transaction(&sender, &recipient, required) {
            warn!(%sender, %recipient, amount, error = %err, "transaction rejected");
            return Err(err.into());
        }

        self.mempool.add(Transaction::transfer(sender, recipient, amount))?;
        debug!(%sender, %recipient, amount, pending = self.mempool.len(), "transaction queued");

        Ok(())
    }

    /// Mine the pending transactions into a new block rewarding `miner`.
    pub fn mine(&mut self, miner: Address) -> Result<Block> {
        self.mine_with_cancel(miner, &CancelToken::new())
    }

    /// Mine like [`Chain::mine`], stopping early if `cancel` fires.
    ///
    /// On cancellation the pending pool, blocks, and ledger are untouched.
    pub fn mine_with_cancel(&mut self, miner: Address, cancel: &CancelToken) -> Result<Block> {
        if !self.ledger.contains(&miner) {
            return Err(ChainError::UnknownMiner(miner));
        }

        let mut transactions = self.mempool.transactions().to_vec();
        transactions.push(Transaction::reward(miner, self.config.mining_reward));

        let tip = self.tip();
        let candidate = Block::new(
            tip.index + 1,
            tip.digest,
            transactions,
            miner,
            self.pow.difficulty(),
        );

        let (block, stats) = self
            .pow
            .seal_with_stats(candidate, cancel)
            .ok_or(ChainError::MiningCancelled)?;

        // Apply to a copy so a failure cannot leave the ledger half-updated.
        let mut staged = self.ledger.clone();
        for tx in &block.transactions {
            staged.apply_transaction(tx)?;
        }

        self.ledger = staged;
        self.blocks.push(block.clone());
        self.mempool.clear();
        self.blocks_mined += 1;

        info!(
            index = block.index,
            digest = %block.digest,
            nonce = block.nonce,
            transactions = block.tx_count(),
            attempts = stats.attempts,
            %miner,
            "block mined"
        );

        Ok(block)
    }

    /// Number of blocks mined after genesis.
    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    /// Recheck every block's digest, work, miner, difficulty, and link.
    pub fn verify(&self) -> bool {
        self.verify_detailed().is_ok()
    }

    /// Like [`Chain::verify`], naming the first failure.
    pub fn verify_detailed(&self) -> std::result::Result<(), ValidationError> {
        ChainValidator::verify_with_difficulty(&self.blocks, self.config.difficulty)
    }

    /// Get chain statistics.
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            total_blocks: self.blocks.len(),
            total_transactions: self.blocks.iter().map(Block::tx_count).sum(),
            total_coins: self.ledger.total_supply(),
            difficulty: self.pow.difficulty(),
            pending_count: self.mempool.len(),
            account_count: self.ledger.accounts_created(),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

/// Display-oriented summary of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub index: u64,
    /// Lowercase hex digest.
    pub digest: String,
    /// Lowercase hex digest of the previous block.
    pub previous_digest: String,
    /// Unix milliseconds.
    pub timestamp: u64,
    pub miner: String,
    pub transactions: usize,
    /// Encoded size of the transaction list in bytes.
    pub size: usize,
    pub difficulty: u32,
    pub nonce: u64,
}

impl From<&Block> for BlockInfo {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            digest: block.digest.to_hex(),
            previous_digest: block.previous_digest.to_hex(),
            timestamp: block.timestamp,
            miner: block.miner.to_hex(),
            transactions: block.tx_count(),
            size: block.size(),
            difficulty: block.difficulty,
            nonce: block.nonce,
        }
    }
}

/// Chain statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    /// Number of blocks including genesis.
    pub total_blocks: usize,
    /// Transactions across all blocks, rewards included.
    pub total_transactions: usize,
    /// Sum of all account balances.
    pub total_coins: u64,
    pub difficulty: u32,
    /// Transactions waiting for the next block.
    pub pending_count: usize,
    pub account_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashchain_core::Hash;

    fn setup_chain(difficulty: u32) -> (Chain, Address, Address) {
        let config = ChainConfig {
            difficulty,
            ..ChainConfig::default()
        };
        let mut chain = Chain::new(config);
        let a = chain.create_account();
        let b = chain.create_account();
        (chain, a, b)
    }

    #[test]
    fn test_chain_init() {
        let chain = Chain::default();

        assert_eq!(chain.height(), 0);
        assert!(chain.tip().is_genesis());
        assert_eq!(chain.config().difficulty, 4);
        assert!(chain.verify());
    }

    #[test]
    fn test_submit_transaction() {
        let (mut chain, a, b) = setup_chain(1);

        assert!(chain.submit_transaction(a, b, 30).is_ok());
        assert_eq!(chain.pending_transactions().len(), 1);
        // Nothing moves until the block is mined.
        assert_eq!(chain.balance(&a), 100);
    }

    #[test]
    fn test_submit_to_unknown_rejected() {
        let (mut chain, a, _) = setup_chain(1);
        let stranger = Address::from_bytes([9u8; 20]);

        let result = chain.submit_transaction(a, stranger, 10);
        assert!(matches!(
            result,
            Err(ChainError::InvalidTransaction(LedgerError::UnknownAccount(addr)))
                if addr == stranger
        ));
        assert!(chain.pending_transactions().is_empty());
        assert_eq!(chain.balance(&a), 100);
    }

    #[test]
    fn test_pending_outflow_counts_against_balance() {
        let (mut chain, a, b) = setup_chain(1);

        assert!(chain.submit_transaction(a, b, 80).is_ok());
        assert!(matches!(
            chain.submit_transaction(a, b, 80),
            Err(ChainError::InvalidTransaction(LedgerError::InsufficientBalance { .. }))
        ));
        assert!(chain.submit_transaction(a, b, 20).is_ok());
        assert_eq!(chain.pending_transactions().len(), 2);
    }

    #[test]
    fn test_system_address_cannot_send() {
        let (mut chain, a, _) = setup_chain(1);
        assert!(chain.submit_transaction(Address::SYSTEM, a, 1).is_err());
    }

    #[test]
    fn test_mine_block() {
        let (mut chain, a, b) = setup_chain(2);
        chain.submit_transaction(a, b, 30).unwrap();

        let block = chain.mine(a).unwrap();

        assert_eq!(block.index, 1);
        assert!(block.digest.to_hex().starts_with("00"));
        assert_eq!(block.tx_count(), 2);
        assert!(block.transactions[1].is_reward());
        assert_eq!(block.previous_digest, chain.blocks()[0].digest);
        assert_eq!(chain.balance(&a), 170);
        assert_eq!(chain.balance(&b), 130);
        assert!(chain.pending_transactions().is_empty());
        assert_eq!(chain.blocks_mined(), 1);
    }

    #[test]
    fn test_mine_unknown_miner() {
        let (mut chain, a, b) = setup_chain(1);
        chain.submit_transaction(a, b, 10).unwrap();

        let stranger = Address::from_bytes([9u8; 20]);
        assert!(matches!(chain.mine(stranger), Err(ChainError::UnknownMiner(_))));
        assert_eq!(chain.pending_transactions().len(), 1);
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_cancelled_mine_leaves_state() {
        let (mut chain, a, b) = setup_chain(1);
        chain.submit_transaction(a, b, 10).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(matches!(
            chain.mine_with_cancel(a, &cancel),
            Err(ChainError::MiningCancelled)
        ));
        assert_eq!(chain.pending_transactions().len(), 1);
        assert!(!chain.pending_transactions()[0].is_reward());
        assert_eq!(chain.height(), 0);
        assert_eq!(chain.balance(&a), 100);
        assert_eq!(chain.blocks_mined(), 0);
    }

    #[test]
    fn test_verify_detects_tampering() {
        let (mut chain, a, b) = setup_chain(1);
        chain.submit_transaction(a, b, 30).unwrap();
        chain.mine(a).unwrap();
        chain.mine(b).unwrap();
        assert!(chain.verify());

        chain.blocks[1].transactions[0].amount = 99;

        assert!(!chain.verify());
        assert!(matches!(
            chain.verify_detailed(),
            Err(ValidationError::DigestMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_verify_detects_single_field_changes() {
        let (mut chain, a, b) = setup_chain(2);
        chain.submit_transaction(a, b, 30).unwrap();
        chain.mine(a).unwrap();
        assert!(chain.verify());

        let mutations: [(&str, fn(&mut Block)); 7] = [
            ("index", |block| block.index += 1),
            ("timestamp", |block| block.timestamp += 1),
            ("nonce", |block| block.nonce += 1),
            ("previous_digest", |block| block.previous_digest = Hash::ZERO),
            ("miner", |block| block.miner = Address::from_bytes([9u8; 20])),
            ("difficulty", |block| block.difficulty -= 1),
            ("amount", |block| block.transactions[0].amount += 1),
        ];

        for (field, mutate) in mutations {
            let original = chain.blocks[1].clone();
            mutate(&mut chain.blocks[1]);
            assert!(!chain.verify(), "{} change went undetected", field);
            chain.blocks[1] = original;
        }
        assert!(chain.verify());
    }

    #[test]
    fn test_verify_detects_tip_rewritten_without_work() {
        let (mut chain, a, b) = setup_chain(2);
        chain.submit_transaction(a, b, 30).unwrap();
        chain.mine(a).unwrap();

        let tip = &mut chain.blocks[1];
        tip.transactions[0].amount = 1;
        tip.difficulty = 0;
        tip.nonce = 0;
        tip.digest = tip.compute_digest();

        assert!(matches!(
            chain.verify_detailed(),
            Err(ValidationError::DifficultyMismatch { index: 1, expected: 2, got: 0 })
        ));
    }

    #[test]
    fn test_block_info() {
        let (mut chain, a, _) = setup_chain(1);
        let block = chain.mine(a).unwrap();

        let info = chain.block_info(1).unwrap();
        assert_eq!(info.index, 1);
        assert_eq!(info.digest, block.digest.to_hex());
        assert_eq!(info.previous_digest, chain.blocks()[0].digest.to_hex());
        assert_eq!(info.miner, a.to_hex());
        assert_eq!(info.transactions, 1);
        assert_eq!(info.difficulty, 1);

        let genesis = chain.block_info(0).unwrap();
        assert_eq!(genesis.previous_digest, "0".repeat(64));
        assert!(chain.block_info(2).is_none());
    }

    #[test]
    fn test_chain_stats() {
        let (mut chain, a, b) = setup_chain(1);
        chain.submit_transaction(a, b, 30).unwrap();
        chain.mine(a).unwrap();
        chain.submit_transaction(b, a, 5).unwrap();

        let stats = chain.stats();
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_coins, 300);
        assert_eq!(stats.difficulty, 1);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.account_count, 2);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ChainConfig = serde_json::from_str(r#"{ "difficulty": 2 }"#).unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, 100);
        assert_eq!(config.starting_balance, 100);
        assert_eq!(config.mempool, MempoolConfig::default());
    }
}
