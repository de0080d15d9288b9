//! Candidate block assembly for blocksmith.
//!
//! Ties the pieces together: transactions from the mempool are validated,
//! ordered by priority, committed to with a merkle root, mined against the
//! configured target and finally verified.
//!
//! # Example
//!
//! ```rust,no_run
//! use blocksmith_chain::{AssemblerConfig, BlockAssembler};
//! use blocksmith_consensus::CancelToken;
//! use blocksmith_core::Target;
//!
//! let config = AssemblerConfig::default().with_target(Target::default());
//! let assembler = BlockAssembler::new(config);
//!
//! let assembly = assembler.assemble(Vec::new(), &CancelToken::new()).unwrap();
//! assert!(assembly.is_valid());
//! ```

pub mod assembler;

pub use assembler::{
    assemble, verify, AssemblerConfig, Assembly, AssemblyError, BlockAssembler, BlockVerdict,
    Collected, Rejection,
};
