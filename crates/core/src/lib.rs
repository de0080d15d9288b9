//! Core block-building primitives for blocksmith.
//!
//! This crate provides the fundamental types used by the assembler:
//! - SHA-256 hashing and 256-bit difficulty targets
//! - secp256k1 witness keys and signatures
//! - Transactions and their canonical encoding
//! - Merkle commitments
//! - Blocks and block headers

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod target;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, BlockHeader, BlockTransaction, Coinbase, HeaderPrefix, DEFAULT_COINBASE_DATA};
pub use crypto::{CryptoError, Keypair, PublicKey, Signature};
pub use hash::{double_sha256, hash_concat, sha256, Hash, H256};
pub use merkle::{empty_root, merkle_root, merkle_root_from_leaves};
pub use target::{Target, TargetError};
pub use transaction::{Transaction, TransactionError, TxInput, TxOutput, Witness};
