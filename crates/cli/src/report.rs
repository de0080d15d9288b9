//! Block report output.
//!
//! The text report keeps the historical `output.txt` layout:
//!
//! ```text
//! Block Header
//! Block Hash: <hex>
//! Nonce: <n>
//! Coinbase Transaction: <coinbase text>
//! Valid Transactions:
//! <coinbase text>
//! <txid>
//! ...
//! ```

use anyhow::{Context, Result};
use blocksmith_chain::Assembly;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Render the text report.
pub fn render_text(assembly: &Assembly) -> String {
    let block = &assembly.block;
    let coinbase = coinbase_text(assembly);

    let mut out = String::new();
    out.push_str("Block Header\n");
    out.push_str(&format!("Block Hash: {}\n", assembly.hash));
    out.push_str(&format!("Nonce: {}\n", block.header.nonce));
    out.push_str(&format!("Coinbase Transaction: {}\n", coinbase));
    out.push_str("Valid Transactions:\n");
    for entry in &block.transactions {
        out.push_str(entry.label());
        out.push('\n');
    }
    out
}

/// The coinbase in its serialized form.
fn coinbase_text(assembly: &Assembly) -> String {
    assembly
        .block
        .coinbase()
        .map(|c| String::from_utf8_lossy(c.serialize()).into_owned())
        .unwrap_or_default()
}

pub fn write_text(path: &Path, assembly: &Assembly) -> Result<()> {
    fs::write(path, render_text(assembly))
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

/// Machine-readable block summary.
#[derive(Debug, Serialize)]
pub struct BlockSummary {
    pub hash: String,
    pub version: u32,
    pub prev_hash: String,
    pub merkle_root: String,
    pub timestamp: u64,
    pub target: String,
    pub nonce: u64,
    pub attempts: u64,
    pub valid: bool,
    pub coinbase: String,
    pub transactions: Vec<String>,
    pub rejected: Vec<RejectedSummary>,
}

#[derive(Debug, Serialize)]
pub struct RejectedSummary {
    pub txid: String,
    pub reason: String,
}

impl From<&Assembly> for BlockSummary {
    fn from(assembly: &Assembly) -> Self {
        let header = &assembly.block.header;
        Self {
            hash: assembly.hash.to_hex(),
            version: header.version,
            prev_hash: header.prev_hash.to_hex(),
            merkle_root: header.merkle_root.to_hex(),
            timestamp: header.timestamp,
            target: header.target.to_hex(),
            nonce: header.nonce,
            attempts: assembly.attempts,
            valid: assembly.is_valid(),
            coinbase: coinbase_text(assembly),
            transactions: assembly
                .block
                .regular_transactions()
                .map(|tx| tx.txid.clone())
                .collect(),
            rejected: assembly
                .rejected
                .iter()
                .map(|r| RejectedSummary {
                    txid: r.txid.clone(),
                    reason: r.reason.to_string(),
                })
                .collect(),
        }
    }
}

pub fn write_json(path: &Path, assembly: &Assembly) -> Result<()> {
    let summary = BlockSummary::from(assembly);
    fs::write(path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksmith_chain::{AssemblerConfig, BlockAssembler};
    use blocksmith_consensus::CancelToken;
    use blocksmith_core::{
        Coinbase, Target, Transaction, TxInput, TxOutput, DEFAULT_COINBASE_DATA,
    };
    use tempfile::TempDir;

    fn sample_assembly() -> Assembly {
        assembly_with(AssemblerConfig::default().with_target(Target::MAX))
    }

    fn assembly_with(config: AssemblerConfig) -> Assembly {
        let txs = vec![2.0, 1.0]
            .into_iter()
            .enumerate()
            .map(|(i, priority)| {
                Transaction::new(
                    vec![TxInput::new(hex::encode([i as u8 + 1; 32]))],
                    vec![TxOutput::new("51", 10)],
                    priority,
                )
                .unwrap()
            })
            .collect();

        BlockAssembler::new(config)
            .assemble_at(txs, 1_700_000_000, &CancelToken::new())
            .unwrap()
    }

    #[test]
    fn test_text_layout() {
        let assembly = sample_assembly();
        let text = render_text(&assembly);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Block Header");
        assert_eq!(lines[1], format!("Block Hash: {}", assembly.hash.to_hex()));
        assert_eq!(lines[2], "Nonce: 0");
        assert_eq!(
            lines[3],
            format!("Coinbase Transaction: {}", DEFAULT_COINBASE_DATA)
        );
        assert_eq!(lines[4], "Valid Transactions:");
        assert_eq!(lines[5], DEFAULT_COINBASE_DATA);

        let txids: Vec<&str> = assembly
            .block
            .regular_transactions()
            .map(|tx| tx.txid.as_str())
            .collect();
        assert_eq!(&lines[6..], txids.as_slice());
    }

    #[test]
    fn test_custom_coinbase_reported() {
        let assembly = assembly_with(
            AssemblerConfig::default()
                .with_target(Target::MAX)
                .with_coinbase(Coinbase::new("reward to miner 7")),
        );
        let text = render_text(&assembly);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[3], "Coinbase Transaction: reward to miner 7");
        assert_eq!(lines[5], "reward to miner 7");
        assert_eq!(BlockSummary::from(&assembly).coinbase, "reward to miner 7");
    }

    #[test]
    fn test_write_text_and_json() {
        let dir = TempDir::new().unwrap();
        let assembly = sample_assembly();
        let text_path = dir.path().join("output.txt");
        let json_path = dir.path().join("block.json");

        write_text(&text_path, &assembly).unwrap();
        write_json(&json_path, &assembly).unwrap();

        assert_eq!(
            fs::read_to_string(&text_path).unwrap(),
            render_text(&assembly)
        );

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["hash"], assembly.hash.to_hex());
        assert_eq!(json["valid"], true);
        assert_eq!(json["transactions"].as_array().unwrap().len(), 2);
    }
}
