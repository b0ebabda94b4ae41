//! Nonce search command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use hashchain_consensus::pow::nonce_digest;
use hashchain_consensus::{find_nonce, CancelToken};
use std::thread;
use std::time::Duration;

#[derive(Args)]
pub struct NonceArgs {
    /// The data to hash
    #[arg(short, long, default_value = "Hello, Blockchain!")]
    data: String,

    /// Hex prefix the digest must start with
    #[arg(short, long, default_value = "0000")]
    prefix: String,

    /// Give up after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,
}

pub fn run(args: NonceArgs) -> Result<()> {
    let cancel = CancelToken::new();
    if let Some(secs) = args.timeout {
        let timer = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            timer.cancel();
        });
    }

    println!();
    println!("Finding nonce for prefix: {}", args.prefix.bright_cyan());

    let prefix = args.prefix.to_ascii_lowercase();
    let solution = find_nonce(args.data.as_bytes(), &prefix, &cancel).context("Invalid prefix")?;

    let Some(solution) = solution else {
        println!("{}", "Search timed out".yellow().bold());
        return Ok(());
    };

    let verified = if nonce_digest(args.data.as_bytes(), solution.nonce) == solution.digest {
        "yes".green().bold()
    } else {
        "no".red().bold()
    };

    println!("  Data:       {}", args.data);
    println!("  Nonce:      {}", solution.nonce.to_string().bright_cyan());
    println!("  Hash:       {}", solution.digest.to_hex().bright_yellow());
    println!("  Time taken: {:.2} seconds", solution.elapsed.as_secs_f64());
    println!("  Verified:   {}", verified);
    println!();

    Ok(())
}
