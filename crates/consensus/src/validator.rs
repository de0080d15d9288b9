//! Transaction and block validation rules.
//!
//! Every rejection carries a reason. Callers that only need the verdict use
//! the `is_valid` helpers, which never panic and never propagate.

use blocksmith_core::{
    Block, BlockTransaction, CryptoError, Hash, PublicKey, Signature, Target, Transaction,
    TransactionError,
};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("first input txid is not valid hex")]
    InvalidInputTxid,

    #[error("transaction encoding failed: {0}")]
    Encoding(String),

    #[error("witness public key rejected: {0}")]
    InvalidPublicKey(CryptoError),

    #[error("witness signature rejected: {0}")]
    InvalidSignature(CryptoError),

    #[error("witness signature does not match the public key")]
    SignatureMismatch,

    #[error("txid mismatch (expected {expected}, computed {computed})")]
    TxidMismatch { expected: String, computed: String },

    #[error("block does not start with a coinbase")]
    MissingCoinbase,

    #[error("unexpected coinbase at position {0}")]
    MisplacedCoinbase(usize),

    #[error("block merkle root verification failed")]
    InvalidMerkleRoot,

    #[error("block hash {hash} does not meet target {target}")]
    InsufficientWork { hash: Hash, target: Target },
}

impl From<TransactionError> for ValidationError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NoInputs => ValidationError::NoInputs,
            TransactionError::InvalidInputTxid => ValidationError::InvalidInputTxid,
            TransactionError::Encoding(msg) => ValidationError::Encoding(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// How a valid transaction's witness was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessStatus {
    /// No signature and public key on the first input; accepted as is.
    Unsigned,
    /// The first input's signature verified against its public key.
    Verified,
}

/// Transaction validator.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Full transaction validation: witness signature (when present) and txid.
    pub fn validate(tx: &Transaction) -> Result<WitnessStatus> {
        let status = match tx.witness().and_then(|w| w.signature_and_key()) {
            Some((signature_hex, public_key_hex)) => {
                Self::verify_witness(tx, signature_hex, public_key_hex)?;
                WitnessStatus::Verified
            }
            None => WitnessStatus::Unsigned,
        };

        Self::validate_txid(tx)?;
        Ok(status)
    }

    /// The verdict alone.
    pub fn is_valid(tx: &Transaction) -> bool {
        Self::validate(tx).is_ok()
    }

    /// Check the witness signature over the decoded first-input txid
    /// followed by the canonical payload.
    pub fn verify_witness(
        tx: &Transaction,
        signature_hex: &str,
        public_key_hex: &str,
    ) -> Result<()> {
        let public_key =
            PublicKey::from_hex(public_key_hex).map_err(ValidationError::InvalidPublicKey)?;
        let signature =
            Signature::from_hex(signature_hex).map_err(ValidationError::InvalidSignature)?;
        let message = tx.signing_message()?;

        public_key
            .verify(&message, &signature)
            .map_err(|_| ValidationError::SignatureMismatch)
    }

    /// Check that the stored txid matches the recomputed one (exact string compare).
    pub fn validate_txid(tx: &Transaction) -> Result<()> {
        let computed = tx.compute_txid()?;
        if computed != tx.txid {
            return Err(ValidationError::TxidMismatch {
                expected: tx.txid.clone(),
                computed,
            });
        }
        Ok(())
    }
}

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Coinbase placement and merkle commitment.
    pub fn validate_block_structure(block: &Block) -> Result<()> {
        if block.coinbase().is_none() {
            return Err(ValidationError::MissingCoinbase);
        }

        if let Some(position) = block
            .transactions
            .iter()
            .skip(1)
            .position(BlockTransaction::is_coinbase)
        {
            return Err(ValidationError::MisplacedCoinbase(position + 1));
        }

        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot);
        }

        Ok(())
    }

    /// Check a block hash against a target.
    pub fn validate_block_hash(hash: &Hash, target: &Target) -> Result<()> {
        if !target.is_met_by(hash) {
            return Err(ValidationError::InsufficientWork {
                hash: *hash,
                target: *target,
            });
        }
        Ok(())
    }

    /// Recompute the header hash and check it against `target`.
    pub fn validate_proof_of_work(block: &Block, target: &Target) -> Result<()> {
        Self::validate_block_hash(&block.hash(), target)
    }

    /// Full block verification (structure + proof of work).
    pub fn verify(block: &Block, target: &Target) -> Result<()> {
        Self::validate_block_structure(block)?;
        Self::validate_proof_of_work(block, target)?;
        Ok(())
    }

    /// The verdict alone.
    pub fn is_valid(block: &Block, target: &Target) -> bool {
        Self::verify(block, target).is_ok()
    }
}
