//! Block assembly.
//!
//! One run walks a fixed sequence of stages:
//! collect (validate every candidate) → order (stable sort by priority) →
//! commit (merkle root, coinbase excluded) → mine → verify.
//! A block that fails verification is reported as invalid; it is never
//! re-mined.

use blocksmith_consensus::{
    BlockValidator, CancelToken, Miner, MinerConfig, MiningError, TransactionValidator,
    ValidationError, WitnessStatus,
};
use blocksmith_core::{
    merkle_root, Block, BlockHeader, Coinbase, Hash, Target, Transaction, TransactionError,
};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop an assembly run before a block exists.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("mining failed: {0}")]
    Mining(#[from] MiningError),

    #[error("merkle commitment failed: {0}")]
    Commitment(#[from] TransactionError),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;

/// Assembler configuration.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Header version.
    pub version: u32,
    /// Hash of the block this candidate builds on.
    pub prev_block_hash: Hash,
    /// Difficulty target used for mining and verification.
    pub target: Target,
    /// Placeholder placed first in the block.
    pub coinbase: Coinbase,
    /// Nonce search settings.
    pub miner: MinerConfig,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            prev_block_hash: Hash::ZERO,
            target: Target::default(),
            coinbase: Coinbase::default(),
            miner: MinerConfig::default(),
        }
    }
}

impl AssemblerConfig {
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_prev_block_hash(mut self, prev_block_hash: Hash) -> Self {
        self.prev_block_hash = prev_block_hash;
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_coinbase(mut self, coinbase: Coinbase) -> Self {
        self.coinbase = coinbase;
        self
    }

    pub fn with_miner(mut self, miner: MinerConfig) -> Self {
        self.miner = miner;
        self
    }
}

/// A candidate that did not make it into the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub txid: String,
    pub reason: ValidationError,
}

/// Final outcome of the verify stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockVerdict {
    Valid,
    Invalid(ValidationError),
}

impl BlockVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, BlockVerdict::Valid)
    }
}

/// Valid candidates in input order plus everything that was turned away.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<Rejection>,
    /// Accepted transactions whose witness signature verified.
    pub verified_signatures: usize,
}

/// Result of one assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub block: Block,
    /// Hash of the solved header.
    pub hash: Hash,
    /// Hashes computed during the nonce search.
    pub attempts: u64,
    pub verdict: BlockVerdict,
    pub rejected: Vec<Rejection>,
    pub verified_signatures: usize,
}

impl Assembly {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }
}

/// Builds one candidate block per call.
#[derive(Debug, Clone, Default)]
pub struct BlockAssembler {
    config: AssemblerConfig,
}

impl BlockAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Validate every candidate in parallel. Input order is kept.
    pub fn collect(&self, transactions: Vec<Transaction>) -> Collected {
        let outcomes: Vec<_> = transactions
            .into_par_iter()
            .map(|tx| {
                let outcome = TransactionValidator::validate(&tx);
                (tx, outcome)
            })
            .collect();

        let mut collected = Collected::default();
        for (tx, outcome) in outcomes {
            match outcome {
                Ok(status) => {
                    if status == WitnessStatus::Verified {
                        collected.verified_signatures += 1;
                    }
                    collected.accepted.push(tx);
                }
                Err(reason) => {
                    debug!(txid = %tx.txid, %reason, "transaction rejected");
                    collected.rejected.push(Rejection {
                        txid: tx.txid,
                        reason,
                    });
                }
            }
        }
        collected
    }

    /// Stable sort by ascending priority. `-0.0` and `0.0` compare equal.
    pub fn order(transactions: &mut [Transaction]) {
        transactions.sort_by(|a, b| sort_key(a.priority).total_cmp(&sort_key(b.priority)));
    }

    /// Header for `transactions` (already ordered) with nonce 0.
    pub fn header_template(&self, transactions: &[Transaction], timestamp: u64) -> Result<BlockHeader> {
        let root = merkle_root(transactions)?;
        Ok(BlockHeader::new(
            self.config.version,
            self.config.prev_block_hash,
            root,
            timestamp,
            self.config.target,
        ))
    }

    /// Assemble a block stamped with the current time.
    pub fn assemble(&self, transactions: Vec<Transaction>, cancel: &CancelToken) -> Result<Assembly> {
        self.assemble_at(transactions, BlockHeader::current_timestamp(), cancel)
    }

    /// Assemble a block with an explicit header timestamp.
    pub fn assemble_at(
        &self,
        transactions: Vec<Transaction>,
        timestamp: u64,
        cancel: &CancelToken,
    ) -> Result<Assembly> {
        let candidates = transactions.len();
        let Collected {
            accepted: mut ordered,
            rejected,
            verified_signatures,
        } = self.collect(transactions);
        info!(
            candidates,
            accepted = ordered.len(),
            rejected = rejected.len(),
            verified_signatures,
            "collected transactions"
        );

        Self::order(&mut ordered);

        let template = self.header_template(&ordered, timestamp)?;
        info!(merkle_root = %template.merkle_root, "committed transactions");

        let solution = Miner::new(self.config.miner.clone()).mine(&template, cancel)?;
        let header = solution.apply(&template);

        let block = Block::new(header, self.config.coinbase.clone(), ordered);
        let verdict = self.verify(&block);
        match &verdict {
            BlockVerdict::Valid => info!(hash = %solution.hash, "block is valid"),
            BlockVerdict::Invalid(reason) => warn!(hash = %solution.hash, %reason, "block is invalid"),
        }

        Ok(Assembly {
            block,
            hash: solution.hash,
            attempts: solution.attempts,
            verdict,
            rejected,
            verified_signatures,
        })
    }

    /// Re-check a block against the configured target.
    pub fn verify(&self, block: &Block) -> BlockVerdict {
        match BlockValidator::verify(block, &self.config.target) {
            Ok(()) => BlockVerdict::Valid,
            Err(reason) => BlockVerdict::Invalid(reason),
        }
    }
}

fn sort_key(priority: f64) -> f64 {
    if priority == 0.0 {
        0.0
    } else {
        priority
    }
}

/// Assemble with default settings and the given target, with no cancellation.
pub fn assemble(transactions: Vec<Transaction>, target: Target) -> Result<Assembly> {
    BlockAssembler::new(AssemblerConfig::default().with_target(target))
        .assemble(transactions, &CancelToken::new())
}

/// Whether `block` is well formed and its header hash is below `target`.
pub fn verify(block: &Block, target: &Target) -> bool {
    BlockValidator::is_valid(block, target)
}
