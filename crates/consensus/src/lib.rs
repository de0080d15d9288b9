//! Transaction validation and proof-of-work mining for blocksmith.
//!
//! This crate provides:
//! - Transaction validation (witness signature, txid self-consistency)
//! - Block verification (coinbase placement, merkle root, proof of work)
//! - A cancellable, optionally multi-threaded nonce search
//!
//! # Example
//!
//! ```rust,no_run
//! use blocksmith_consensus::{BlockValidator, CancelToken, Miner, MinerConfig};
//! use blocksmith_core::{empty_root, Block, BlockHeader, Coinbase, Hash, Target};
//!
//! let target = Target::default();
//! let template = BlockHeader::new(1, Hash::ZERO, empty_root(), 1_700_000_000, target);
//!
//! let miner = Miner::new(MinerConfig::default().with_threads(4));
//! let solution = miner.mine(&template, &CancelToken::new()).unwrap();
//!
//! let block = Block::new(solution.apply(&template), Coinbase::default(), vec![]);
//! assert!(BlockValidator::is_valid(&block, &target));
//! ```

pub mod pow;
pub mod validator;

// Re-export commonly used types
pub use pow::{mine, CancelToken, Miner, MinerConfig, MiningError, Solution};
pub use validator::{BlockValidator, TransactionValidator, ValidationError, WitnessStatus};
