//! Validate command.

use crate::mempool::read_transaction;
use anyhow::{bail, Result};
use blocksmith_consensus::{TransactionValidator, WitnessStatus};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ValidateArgs {
    /// Transaction JSON files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let mut invalid = 0usize;

    for path in &args.files {
        let name = path.display().to_string();
        let tx = match read_transaction(path) {
            Ok(tx) => tx,
            Err(e) => {
                invalid += 1;
                println!("{}  {}: {:#}", "✗".red().bold(), name, e);
                continue;
            }
        };

        match TransactionValidator::validate(&tx) {
            Ok(WitnessStatus::Verified) => println!(
                "{}  {} {}",
                "✓".green().bold(),
                tx.txid.bright_yellow(),
                "(signature verified)".bright_black()
            ),
            Ok(WitnessStatus::Unsigned) => println!(
                "{}  {} {}",
                "✓".green().bold(),
                tx.txid.bright_yellow(),
                "(unsigned)".bright_black()
            ),
            Err(reason) => {
                invalid += 1;
                println!("{}  {}: {}", "✗".red().bold(), name, reason.to_string().red());
            }
        }
    }

    println!();
    println!(
        "  {} valid, {} invalid",
        (args.files.len() - invalid).to_string().bright_cyan(),
        invalid.to_string().bright_black()
    );

    if invalid > 0 {
        bail!("{} of {} transactions failed validation", invalid, args.files.len());
    }
    Ok(())
}
