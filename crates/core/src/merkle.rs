//! Merkle commitment over the transactions of a block.
//!
//! Leaves and interior nodes both use double SHA-256. An odd level
//! duplicates its last hash before pairing. The empty set commits to
//! SHA-256 of the empty byte string.

use crate::hash::{double_hash_concat, sha256, Hash};
use crate::transaction::{Result, Transaction};

/// Root committed to by a block with no transactions.
pub fn empty_root() -> Hash {
    sha256(b"")
}

/// Compute the merkle root of a list of leaf hashes.
pub fn merkle_root_from_leaves(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return empty_root();
    }

    let mut current_level: Vec<Hash> = leaves.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));

        for chunk in current_level.chunks(2) {
            let right = chunk.get(1).unwrap_or(&chunk[0]);
            next_level.push(double_hash_concat(&[chunk[0].as_ref(), right.as_ref()]));
        }

        current_level = next_level;
    }

    current_level[0]
}

/// Compute the merkle root of an ordered transaction list.
pub fn merkle_root(transactions: &[Transaction]) -> Result<Hash> {
    let leaves = transactions
        .iter()
        .map(Transaction::leaf_hash)
        .collect::<Result<Vec<_>>>()?;
    Ok(merkle_root_from_leaves(&leaves))
}
