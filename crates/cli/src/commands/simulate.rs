//! Scripted ledger session.
//!
//! Opens accounts, submits a deterministic round of transfers before each
//! block, mines with miners chosen round-robin, then verifies the chain and
//! prints balances and statistics.

use super::format_millis;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use hashchain_chain::{BlockInfo, Chain, ChainConfig};
use hashchain_core::Address;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of accounts to open
    #[arg(short, long, default_value = "3")]
    accounts: usize,

    /// Number of blocks to mine
    #[arg(short, long, default_value = "3")]
    blocks: u64,

    /// Transfers submitted before each block
    #[arg(short, long, default_value = "2")]
    transfers: usize,

    /// Override the configured difficulty
    #[arg(short, long)]
    difficulty: Option<u32>,

    /// JSON file with chain configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

/// Load a chain configuration, falling back to defaults when no path is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ChainConfig> {
    let Some(path) = path else {
        return Ok(ChainConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config file: {:?}", path))
}

/// The transfer submitted as the `step`-th of `round`.
///
/// Needs at least two accounts; the recipient offset stays in `1..n`, so no
/// transfer is a self-transfer.
fn scripted_transfer(accounts: &[Address], round: u64, step: usize) -> (Address, Address, u64) {
    let n = accounts.len();
    let from = (round as usize + step) % n;
    let to = (from + 1 + step % (n - 1)) % n;
    let amount = 5 * (step as u64 + 1) + round;
    (accounts[from], accounts[to], amount)
}

pub fn run(args: SimulateArgs) -> Result<()> {
    if args.accounts < 2 {
        bail!("simulation needs at least 2 accounts");
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(difficulty) = args.difficulty {
        config.difficulty = difficulty;
    }

    let mut chain = Chain::new(config);
    let accounts: Vec<Address> = (0..args.accounts).map(|_| chain.create_account()).collect();

    if !args.json {
        println!();
        println!("{}", "Running simulation...".bold().cyan());
        println!();
        println!("{}  Opened {} accounts", "✓".green().bold(), accounts.len());
    }

    for round in 0..args.blocks {
        for step in 0..args.transfers {
            let (from, to, amount) = scripted_transfer(&accounts, round, step);
            let accepted = chain.submit_transaction(from, to, amount).is_ok();
            if !args.json {
                let mark = if accepted { "✓".green().bold() } else { "✗".red().bold() };
                println!("{}  {} -> {}: {}", mark, short(&from), short(&to), amount);
            }
        }

        let miner = accounts[round as usize % accounts.len()];
        let block = chain
            .mine(miner)
            .with_context(|| format!("Failed to mine block {}", round + 1))?;

        if !args.json {
            println!(
                "{}  Mined block #{} nonce={} {}",
                "✓".green().bold(),
                block.index,
                block.nonce.to_string().bright_cyan(),
                block.digest.to_hex().bright_yellow()
            );
        }
    }

    let valid = chain.verify();

    if args.json {
        print_json(&chain, valid)
    } else {
        print_report(&chain, valid);
        Ok(())
    }
}

fn short(address: &Address) -> String {
    address.to_hex()[..10].to_string()
}

fn print_json(chain: &Chain, valid: bool) -> Result<()> {
    let blocks: Vec<BlockInfo> = (0..=chain.height())
        .filter_map(|i| chain.block_info(i))
        .collect();
    let accounts: Vec<serde_json::Value> = chain
        .ledger()
        .accounts()
        .map(|a| {
            serde_json::json!({
                "address": a.address.to_hex(),
                "balance": a.balance,
                "transactions": a.transaction_count,
                "created_at": a.created_at,
                "last_active": a.last_active,
            })
        })
        .collect();

    let out = serde_json::json!({
        "valid": valid,
        "stats": chain.stats(),
        "blocks": blocks,
        "accounts": accounts,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_report(chain: &Chain, valid: bool) {
    println!();
    println!("{}", "Blocks:".bold().cyan());
    for index in 0..=chain.height() {
        let Some(info) = chain.block_info(index) else {
            continue;
        };
        println!(
            "  #{:<3} {}  txs={} size={}B  {}",
            info.index,
            info.digest.bright_yellow(),
            info.transactions,
            info.size,
            format_millis(info.timestamp).bright_black()
        );
    }

    println!();
    println!("{}", "Accounts:".bold().cyan());
    for account in chain.ledger().accounts() {
        println!(
            "  {}  balance={:<6} txs={:<3} last active {}",
            account.address.to_hex().bright_yellow(),
            account.balance,
            account.transaction_count,
            format_millis(account.last_active).bright_black()
        );
    }

    let stats = chain.stats();
    println!();
    println!("{}", "Stats:".bold().cyan());
    println!("  Total blocks:       {}", stats.total_blocks);
    println!("  Total transactions: {}", stats.total_transactions);
    println!("  Total coins:        {}", stats.total_coins);
    println!("  Difficulty:         {}", stats.difficulty);
    println!("  Pending:            {}", stats.pending_count);
    println!("  Accounts:           {}", stats.account_count);

    println!();
    if valid {
        println!("{}", "Chain verified".green().bold());
    } else if let Err(err) = chain.verify_detailed() {
        println!("{} {}", "Chain verification failed:".red().bold(), err);
    }
    println!();
}
