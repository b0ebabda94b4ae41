//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;

mod merkle;
mod nonce;
mod simulate;

#[derive(Subcommand)]
pub enum Commands {
    /// Build a Merkle commitment over records
    Merkle(merkle::MerkleArgs),
    /// Search for a nonce whose digest starts with a hex prefix
    Nonce(nonce::NonceArgs),
    /// Run a scripted ledger session and report the result
    Simulate(simulate::SimulateArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Merkle(args) => merkle::run(args),
        Commands::Nonce(args) => nonce::run(args),
        Commands::Simulate(args) => simulate::run(args),
    }
}

/// Render Unix milliseconds as a UTC date-time.
pub(crate) fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(0), "1970-01-01 00:00:00.000 UTC");
        assert_eq!(format_millis(1_500), "1970-01-01 00:00:01.500 UTC");
    }
}
