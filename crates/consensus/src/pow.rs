//! Proof-of-work nonce search.
//!
//! The miner varies only the nonce of a header template until the header
//! hash falls strictly below the header's target. A single thread scans
//! nonces upward from 0. With `n` threads, worker `i` scans
//! `i, i + n, i + 2n, ...`; the first worker to win the `found` flag reports
//! the only solution and every other worker stops at its next iteration.

use blocksmith_core::{BlockHeader, Hash};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while mining.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("no nonce up to {max_nonce} meets the target")]
    NonceSpaceExhausted { max_nonce: u64 },

    #[error("miner needs at least one thread")]
    NoThreads,
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// Shared stop signal for a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker holding a clone of this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A nonce that solves a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub hash: Hash,
    pub nonce: u64,
    /// Hashes computed across all workers.
    pub attempts: u64,
}

impl Solution {
    /// The template with the winning nonce filled in.
    pub fn apply(&self, template: &BlockHeader) -> BlockHeader {
        template.clone().with_nonce(self.nonce)
    }
}

/// Miner configuration.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Worker threads; 1 searches sequentially from nonce 0.
    pub threads: usize,
    /// Largest nonce tried (inclusive).
    pub max_nonce: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            max_nonce: u64::MAX,
        }
    }
}

impl MinerConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }
}

/// Proof-of-work miner.
#[derive(Debug, Clone, Default)]
pub struct Miner {
    config: MinerConfig,
}

impl Miner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Search for a nonce solving `template` until found, exhausted or cancelled.
    pub fn mine(&self, template: &BlockHeader, cancel: &CancelToken) -> Result<Solution> {
        info!(
            threads = self.config.threads,
            max_nonce = self.config.max_nonce,
            difficulty_target = %template.target,
            "starting nonce search"
        );

        let result = match self.config.threads {
            0 => Err(MiningError::NoThreads),
            1 => search_sequential(template, self.config.max_nonce, cancel),
            threads => search_parallel(template, threads, self.config.max_nonce, cancel),
        };

        if let Ok(solution) = &result {
            info!(
                nonce = solution.nonce,
                attempts = solution.attempts,
                hash = %solution.hash,
                "nonce found"
            );
        }
        result
    }
}

/// Sequential search from nonce 0 with no upper bound other than `u64::MAX`.
pub fn mine(template: &BlockHeader, cancel: &CancelToken) -> Result<Solution> {
    Miner::default().mine(template, cancel)
}

fn search_sequential(
    template: &BlockHeader,
    max_nonce: u64,
    cancel: &CancelToken,
) -> Result<Solution> {
    let prefix = template.prefix();
    let target = template.target;
    let mut nonce = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Err(MiningError::Cancelled { attempts: nonce });
        }

        let hash = prefix.hash(nonce);
        if target.is_met_by(&hash) {
            return Ok(Solution {
                hash,
                nonce,
                attempts: nonce.saturating_add(1),
            });
        }

        if nonce >= max_nonce {
            return Err(MiningError::NonceSpaceExhausted { max_nonce });
        }
        nonce += 1;
    }
}

fn search_parallel(
    template: &BlockHeader,
    threads: usize,
    max_nonce: u64,
    cancel: &CancelToken,
) -> Result<Solution> {
    let prefix = template.prefix();
    let target = template.target;
    let stride = threads as u64;

    let found = AtomicBool::new(false);
    let attempts = AtomicU64::new(0);
    let (sender, receiver) = bounded::<(Hash, u64)>(1);

    thread::scope(|scope| {
        for worker in 0..stride {
            let sender = sender.clone();
            let prefix = &prefix;
            let found = &found;
            let attempts = &attempts;

            scope.spawn(move || {
                let mut nonce = worker;
                let mut local = 0u64;

                while nonce <= max_nonce {
                    if found.load(Ordering::Acquire) || cancel.is_cancelled() {
                        break;
                    }

                    let hash = prefix.hash(nonce);
                    local += 1;

                    if target.is_met_by(&hash) {
                        if found
                            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                        {
                            // Capacity 1 and a single winner: never blocks.
                            let _ = sender.send((hash, nonce));
                            debug!(worker, nonce, "worker won the search");
                        }
                        break;
                    }

                    match nonce.checked_add(stride) {
                        Some(next) => nonce = next,
                        None => break,
                    }
                }

                attempts.fetch_add(local, Ordering::Relaxed);
                debug!(worker, attempts = local, "worker stopped");
            });
        }
    });
    drop(sender);

    let attempts = attempts.into_inner();
    match receiver.try_recv() {
        Ok((hash, nonce)) => Ok(Solution {
            hash,
            nonce,
            attempts,
        }),
        Err(_) if cancel.is_cancelled() => Err(MiningError::Cancelled { attempts }),
        Err(_) => Err(MiningError::NonceSpaceExhausted { max_nonce }),
    }
}
