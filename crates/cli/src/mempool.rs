//! Loading candidate transactions from a directory of JSON records.

use anyhow::{Context, Result};
use blocksmith_core::Transaction;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file that could not be turned into a transaction.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Transactions read from a mempool directory.
#[derive(Debug, Default)]
pub struct Mempool {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedFile>,
}

impl Mempool {
    /// Read every `*.json` file in `dir`, in file name order.
    ///
    /// Unreadable or unparseable files are logged and skipped. Only a
    /// missing or unlistable directory is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read mempool directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut mempool = Mempool::default();
        for path in paths {
            match read_transaction(&path) {
                Ok(tx) => {
                    debug!(path = %path.display(), txid = %tx.txid, "loaded transaction");
                    mempool.transactions.push(tx);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping mempool file");
                    mempool.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(mempool)
    }
}

/// Parse one transaction file.
pub fn read_transaction(path: &Path) -> Result<Transaction> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Transaction::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
}
