//! Block and block header structures.

use crate::hash::{Hash, H256};
use crate::merkle::merkle_root_from_leaves;
use crate::target::Target;
use crate::transaction::{Result, Transaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Text carried by the coinbase placeholder when none is configured.
pub const DEFAULT_COINBASE_DATA: &str = "Serialized coinbase transaction";

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root of the regular transactions.
    pub merkle_root: Hash,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// The header hash must be strictly below this.
    pub target: Target,
    /// Chosen by the miner.
    pub nonce: u64,
}

/// SHA-256 state over every header field except the nonce.
///
/// Cloning the state and feeding it a nonce is all a miner does per attempt.
#[derive(Clone)]
pub struct HeaderPrefix(Sha256);

impl HeaderPrefix {
    /// Hash of the header with `nonce` appended.
    pub fn hash(&self, nonce: u64) -> Hash {
        let mut hasher = self.0.clone();
        hasher.update(nonce.to_le_bytes());
        let digest: H256 = hasher.finalize().into();
        Hash(digest)
    }
}

impl BlockHeader {
    /// Create a header with nonce 0.
    pub fn new(
        version: u32,
        prev_hash: Hash,
        merkle_root: Hash,
        timestamp: u64,
        target: Target,
    ) -> Self {
        Self {
            version,
            prev_hash,
            merkle_root,
            timestamp,
            target,
            nonce: 0,
        }
    }

    /// Hash state over `version ‖ prev_hash ‖ merkle_root ‖ timestamp ‖ target`.
    pub fn prefix(&self) -> HeaderPrefix {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(self.merkle_root.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.target.as_bytes());
        HeaderPrefix(hasher)
    }

    /// Calculate the hash of this block header.
    pub fn hash(&self) -> Hash {
        self.prefix().hash(self.nonce)
    }

    /// Check whether the header hash is below its own target.
    pub fn meets_target(&self) -> bool {
        self.target.is_met_by(&self.hash())
    }

    /// The same header with a different nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Get the current Unix timestamp.
    pub fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Placeholder for the block reward transaction.
///
/// It is never validated and is not part of the merkle commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coinbase {
    pub data: String,
}

impl Coinbase {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// The coinbase serializes as its UTF-8 text.
    pub fn serialize(&self) -> &[u8] {
        self.data.as_bytes()
    }
}

impl Default for Coinbase {
    fn default() -> Self {
        Self::new(DEFAULT_COINBASE_DATA)
    }
}

/// An entry in a block's transaction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTransaction {
    Coinbase(Coinbase),
    Regular(Transaction),
}

impl BlockTransaction {
    /// The txid for regular transactions, the coinbase text otherwise.
    pub fn label(&self) -> &str {
        match self {
            BlockTransaction::Coinbase(coinbase) => &coinbase.data,
            BlockTransaction::Regular(tx) => &tx.txid,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, BlockTransaction::Coinbase(_))
    }
}

/// A candidate block: a coinbase followed by ordered regular transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<BlockTransaction>,
}

impl Block {
    /// Create a block, placing the coinbase first.
    pub fn new(header: BlockHeader, coinbase: Coinbase, transactions: Vec<Transaction>) -> Self {
        let mut entries = Vec::with_capacity(transactions.len() + 1);
        entries.push(BlockTransaction::Coinbase(coinbase));
        entries.extend(transactions.into_iter().map(BlockTransaction::Regular));
        Self {
            header,
            transactions: entries,
        }
    }

    /// Get the block hash (hash of the header).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// The coinbase, when it occupies the first slot.
    pub fn coinbase(&self) -> Option<&Coinbase> {
        match self.transactions.first() {
            Some(BlockTransaction::Coinbase(coinbase)) => Some(coinbase),
            _ => None,
        }
    }

    /// Regular transactions in block order.
    pub fn regular_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter_map(|entry| match entry {
            BlockTransaction::Regular(tx) => Some(tx),
            BlockTransaction::Coinbase(_) => None,
        })
    }

    /// Get the number of entries in this block, coinbase included.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Merkle root recomputed from the regular transactions.
    pub fn compute_merkle_root(&self) -> Result<Hash> {
        let leaves = self
            .regular_transactions()
            .map(Transaction::leaf_hash)
            .collect::<Result<Vec<_>>>()?;
        Ok(merkle_root_from_leaves(&leaves))
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        self.compute_merkle_root()
            .is_ok_and(|computed| computed == self.header.merkle_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::{empty_root, merkle_root};
    use crate::transaction::{TxInput, TxOutput};

    fn sample_tx(seed: u8, priority: f64) -> Transaction {
        Transaction::new(
            vec![TxInput::new(hex::encode([seed; 32]))],
            vec![TxOutput::new("51", seed as u64)],
            priority,
        )
        .unwrap()
    }

    fn sample_header(merkle_root: Hash) -> BlockHeader {
        BlockHeader::new(1, Hash::ZERO, merkle_root, 1_700_000_000, Target::MAX)
    }

    #[test]
    fn test_header_hash_deterministic() {
        let header = sample_header(Hash::ZERO);
        assert_eq!(header.hash(), header.hash());
    }

    #[test]
    fn test_header_hash_depends_on_every_field() {
        let base = sample_header(Hash::ZERO);
        let variants = [
            BlockHeader { version: 2, ..base.clone() },
            BlockHeader { prev_hash: Hash([1; 32]), ..base.clone() },
            BlockHeader { merkle_root: Hash([1; 32]), ..base.clone() },
            BlockHeader { timestamp: 1, ..base.clone() },
            BlockHeader { target: Target::default(), ..base.clone() },
            base.clone().with_nonce(1),
        ];
        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn test_prefix_matches_full_hash() {
        let header = sample_header(Hash([7; 32])).with_nonce(99);
        assert_eq!(header.prefix().hash(99), header.hash());
    }

    #[test]
    fn test_new_header_starts_at_nonce_zero() {
        assert_eq!(sample_header(Hash::ZERO).nonce, 0);
    }

    #[test]
    fn test_coinbase_is_first() {
        let block = Block::new(
            sample_header(Hash::ZERO),
            Coinbase::default(),
            vec![sample_tx(1, 1.0), sample_tx(2, 2.0)],
        );

        assert_eq!(block.tx_count(), 3);
        assert_eq!(block.coinbase(), Some(&Coinbase::default()));
        assert_eq!(block.transactions[0].label(), DEFAULT_COINBASE_DATA);
        assert_eq!(block.regular_transactions().count(), 2);
    }

    #[test]
    fn test_merkle_root_excludes_coinbase() {
        let txs = vec![sample_tx(1, 1.0), sample_tx(2, 2.0), sample_tx(3, 3.0)];
        let root = merkle_root(&txs).unwrap();
        let block = Block::new(sample_header(root), Coinbase::new("anything"), txs);

        assert!(block.verify_merkle_root());
        assert_eq!(block.compute_merkle_root().unwrap(), root);
    }

    #[test]
    fn test_empty_block_merkle_root() {
        let block = Block::new(sample_header(empty_root()), Coinbase::default(), vec![]);
        assert!(block.verify_merkle_root());
        assert_eq!(block.tx_count(), 1);
    }

    #[test]
    fn test_tampered_transaction_breaks_merkle_root() {
        let txs = vec![sample_tx(1, 1.0), sample_tx(2, 2.0)];
        let root = merkle_root(&txs).unwrap();
        let mut block = Block::new(sample_header(root), Coinbase::default(), txs);

        if let BlockTransaction::Regular(tx) = &mut block.transactions[1] {
            tx.vout[0].value += 1;
        }
        assert!(!block.verify_merkle_root());
    }

    #[test]
    fn test_coinbase_serialization_rule() {
        assert_eq!(Coinbase::new("abc").serialize(), b"abc");
    }
}
