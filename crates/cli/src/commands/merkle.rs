//! Merkle commitment command.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use hashchain_core::MerkleCommitment;

#[derive(Args)]
pub struct MerkleArgs {
    /// Records to commit to, in order
    records: Vec<String>,

    /// Generate "Transaction 1".."Transaction N" instead of passing records
    #[arg(short, long, conflicts_with = "records")]
    count: Option<usize>,

    /// Print the commitment as JSON
    #[arg(long)]
    json: bool,
}

fn collect_records(args: &MerkleArgs) -> Result<Vec<String>> {
    let records = match args.count {
        Some(n) => (1..=n).map(|i| format!("Transaction {}", i)).collect(),
        None => args.records.clone(),
    };
    if records.is_empty() {
        bail!("no records given; pass records or --count");
    }
    Ok(records)
}

pub fn run(args: MerkleArgs) -> Result<()> {
    let records = collect_records(&args)?;
    let tree = MerkleCommitment::build(&records).context("Failed to build commitment")?;

    if args.json {
        let levels: Vec<Vec<String>> = tree
            .levels()
            .iter()
            .map(|level| level.iter().map(|h| h.to_hex()).collect())
            .collect();
        let out = serde_json::json!({
            "root": tree.root().to_hex(),
            "height": tree.height(),
            "levels": levels,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", "Merkle Commitment".bold().cyan());
    println!();
    println!("  Records: {}", records.len().to_string().bright_cyan());
    println!("  Height:  {}", tree.height().to_string().bright_cyan());
    println!("  Root:    {}", tree.root().to_hex().bright_yellow());

    for index in (0..tree.height()).rev() {
        let Some(level) = tree.level(index) else {
            continue;
        };
        println!();
        println!("  {}", format!("Level {}", index).bold());
        for (i, digest) in level.iter().enumerate() {
            let label = if index == 0 {
                format!("T{}", i + 1)
            } else {
                format!("N{}", i)
            };
            println!("    {:<6} {}", label, digest.to_hex());
        }
        if level.len() > 1 && level.len() % 2 == 1 {
            println!(
                "    {:<6} {}",
                "(dup)".bright_black(),
                level[level.len() - 1].to_hex().bright_black()
            );
        }
    }
    println!();

    Ok(())
}
