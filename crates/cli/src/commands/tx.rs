//! Transaction operations command.

use anyhow::{Context, Result};
use blocksmith_core::{Keypair, Transaction, TxInput, TxOutput, Witness};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Create a transaction record with a correct txid
    New {
        /// Previous output txid spent by the single input (hex, random if omitted)
        #[arg(long)]
        prev_txid: Option<String>,

        /// Output script (hex)
        #[arg(long, default_value = "0014")]
        scriptpubkey: String,

        /// Output value
        #[arg(long, default_value = "0")]
        value: u64,

        /// Ordering priority inside the block
        #[arg(short, long, default_value = "0")]
        priority: f64,

        /// Sign the first input with a freshly generated key
        #[arg(short, long)]
        sign: bool,

        /// Write the record here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn run(args: TxArgs) -> Result<()> {
    match args.command {
        TxCommand::New {
            prev_txid,
            scriptpubkey,
            value,
            priority,
            sign,
            out,
        } => new_transaction(prev_txid, scriptpubkey, value, priority, sign, out),
    }
}

fn new_transaction(
    prev_txid: Option<String>,
    scriptpubkey: String,
    value: u64,
    priority: f64,
    sign: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let prev_txid = match prev_txid {
        Some(txid) => {
            hex::decode(&txid).with_context(|| format!("Invalid input txid: {}", txid))?;
            txid
        }
        None => hex::encode(rand::random::<[u8; 32]>()),
    };

    let mut tx = Transaction::new(
        vec![TxInput::new(prev_txid)],
        vec![TxOutput::new(scriptpubkey, value)],
        priority,
    )
    .context("Failed to build transaction")?;

    if sign {
        let keypair = Keypair::generate();
        let signature = keypair.sign(&tx.signing_message()?);
        tx.vin[0].witness = Some(Witness::new(
            signature.to_hex(),
            keypair.public_key.to_hex(),
        ));
        eprintln!(
            "  Public Key:  {}",
            keypair.public_key.to_hex().bright_black()
        );
    }

    let json = serde_json::to_string_pretty(&tx)?;
    match out {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{}  {} saved to: {}",
                "✓".green().bold(),
                tx.txid.bright_yellow(),
                path.display().to_string().bright_black()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
