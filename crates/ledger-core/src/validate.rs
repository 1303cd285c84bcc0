//! Block-level and chain-level validity predicates.

use crate::block::Sealable;
use crate::error::{LedgerError, Result};
use tracing::warn;

/// True when the cached hash matches a fresh digest of the block's fields.
pub fn is_self_valid<B: Sealable + ?Sized>(block: &B) -> bool {
    block.compute_hash() == *block.hash()
}

/// True when `candidate_prev` is untampered and `block` points at its hash.
pub fn is_predecessor<B, P>(block: &B, candidate_prev: &P) -> bool
where
    B: Sealable + ?Sized,
    P: Sealable + ?Sized,
{
    is_self_valid(candidate_prev) && block.previous_hash() == &candidate_prev.hash()[..]
}

/// Walks `blocks` and reports the first block that fails.
///
/// The first block is checked for self-validity but not for linkage, so a
/// lone tampered genesis is still rejected. An empty slice is valid.
pub fn validate_chain<B: Sealable>(blocks: &[B]) -> Result<()> {
    if let Some(genesis) = blocks.first() {
        if !is_self_valid(genesis) {
            return Err(LedgerError::TamperedBlock { index: 0 });
        }
    }

    for (offset, pair) in blocks.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let index = offset + 1;
        if !is_self_valid(cur) {
            return Err(LedgerError::TamperedBlock { index });
        }
        if !is_predecessor(cur, prev) {
            return Err(LedgerError::BrokenLink { index });
        }
    }
    Ok(())
}

pub fn is_chain_valid<B: Sealable>(blocks: &[B]) -> bool {
    match validate_chain(blocks) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "chain validation failed");
            false
        }
    }
}
