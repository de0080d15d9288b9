//! Mine command: mempool in, report out.

use crate::mempool::Mempool;
use crate::report;
use anyhow::{Context, Result};
use blocksmith_chain::{AssemblerConfig, BlockAssembler, BlockVerdict};
use blocksmith_consensus::{CancelToken, MinerConfig};
use blocksmith_core::{Coinbase, Hash, Target};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Args)]
pub struct MineArgs {
    /// Directory of transaction JSON files
    #[arg(short, long, default_value = "./mempool")]
    mempool: PathBuf,

    /// Text report path
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// Also write a JSON block summary to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Difficulty target as up to 64 hex digits
    #[arg(short, long, conflicts_with = "difficulty_bits")]
    target: Option<String>,

    /// Difficulty as a number of leading zero bits
    #[arg(long)]
    difficulty_bits: Option<u32>,

    /// Previous block hash (hex)
    #[arg(long)]
    prev_hash: Option<String>,

    /// Coinbase placeholder text
    #[arg(long)]
    coinbase: Option<String>,

    /// Mining threads
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Largest nonce to try
    #[arg(long)]
    max_nonce: Option<u64>,

    /// Give up mining after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl MineArgs {
    fn assembler_config(&self) -> Result<AssemblerConfig> {
        let mut config = AssemblerConfig::default();

        if let Some(target) = &self.target {
            let target: Target = target
                .parse()
                .with_context(|| format!("Invalid target: {}", target))?;
            config = config.with_target(target);
        } else if let Some(bits) = self.difficulty_bits {
            config = config.with_target(
                Target::from_leading_zero_bits(bits)
                    .with_context(|| format!("Invalid difficulty: {} bits", bits))?,
            );
        }

        if let Some(prev) = &self.prev_hash {
            let prev = Hash::from_hex(prev)
                .with_context(|| format!("Invalid previous block hash: {}", prev))?;
            config = config.with_prev_block_hash(prev);
        }

        if let Some(data) = &self.coinbase {
            config = config.with_coinbase(Coinbase::new(data.clone()));
        }

        let mut miner = MinerConfig::default().with_threads(self.threads);
        if let Some(max_nonce) = self.max_nonce {
            miner = miner.with_max_nonce(max_nonce);
        }
        Ok(config.with_miner(miner))
    }
}

pub fn run(args: MineArgs) -> Result<()> {
    let config = args.assembler_config()?;
    let mempool = Mempool::load(&args.mempool)?;

    println!("{}", "Assembling block...".bold().cyan());
    println!();
    println!(
        "  Mempool:      {} loaded, {} skipped",
        mempool.transactions.len().to_string().bright_cyan(),
        mempool.skipped.len().to_string().bright_black()
    );
    println!("  Target:       {}", config.target.to_string().bright_black());

    let cancel = CancelToken::new();
    // Dropping `done` disconnects the timer so it exits without cancelling.
    let (done, finished) = bounded::<()>(0);
    if let Some(secs) = args.timeout_secs {
        let cancel = cancel.clone();
        thread::spawn(move || {
            if finished.recv_timeout(Duration::from_secs(secs)) == Err(RecvTimeoutError::Timeout) {
                tracing::warn!(secs, "mining timed out");
                cancel.cancel();
            }
        });
    }

    let assembler = BlockAssembler::new(config);
    let result = assembler.assemble(mempool.transactions, &cancel);
    drop(done);
    let assembly = result.context("Failed to assemble block")?;

    println!(
        "  Included:     {} ({} signed)",
        assembly.block.regular_transactions().count().to_string().bright_cyan(),
        assembly.verified_signatures
    );
    println!(
        "  Rejected:     {}",
        assembly.rejected.len().to_string().bright_black()
    );
    for rejection in &assembly.rejected {
        println!(
            "    {} {}",
            rejection.txid.bright_black(),
            rejection.reason.to_string().red()
        );
    }
    println!("  Nonce:        {}", assembly.block.header.nonce.to_string().bright_cyan());
    println!("  Attempts:     {}", assembly.attempts);
    if let Some(time) = DateTime::<Utc>::from_timestamp(assembly.block.header.timestamp as i64, 0) {
        println!("  Timestamp:    {}", time.to_rfc3339().bright_black());
    }
    println!("  Block Hash:   {}", assembly.hash.to_hex().bright_yellow());

    report::write_text(&args.output, &assembly)?;
    if let Some(json) = &args.json {
        report::write_json(json, &assembly)?;
    }

    println!();
    println!(
        "{}  Report written to: {}",
        "✓".green().bold(),
        args.output.display().to_string().bright_black()
    );
    println!();

    match &assembly.verdict {
        BlockVerdict::Valid => println!("{}", "Block is valid.".green().bold()),
        BlockVerdict::Invalid(reason) => {
            println!("{}", "Block is invalid.".red().bold());
            println!("  Reason: {}", reason);
        }
    }

    Ok(())
}
