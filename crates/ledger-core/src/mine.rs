use crate::block::Sealable;
use crate::error::{LedgerError, Result};
use crate::pow::{CancelFlag, Difficulty, SealReport};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Searches nonces in parallel until one yields a hash meeting `difficulty`.
///
/// Workers probe candidates through `digest_with_nonce` on a shared reference,
/// so the block itself is only written once, with the first winning nonce any
/// worker reports. Candidates start one past the current nonce, as in the
/// sequential search, though the winner need not be the smallest.
pub(crate) fn search_parallel<B: Sealable>(
    block: &mut B,
    difficulty: &Difficulty,
    max_attempts: Option<u64>,
    cancel: Option<&CancelFlag>,
) -> Result<SealReport> {
    let start = block.nonce().wrapping_add(1);
    let end = match max_attempts {
        Some(max) => start.saturating_add(max),
        None => u64::MAX,
    };
    let attempts = AtomicU64::new(0);

    let template: &B = block;
    // Some(None) marks a cancelled search, None an exhausted range.
    let found = (start..end).into_par_iter().find_map_any(|nonce| {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return Some(None);
        }
        attempts.fetch_add(1, Ordering::Relaxed);
        let hash = template.digest_with_nonce(nonce);
        difficulty.is_met_by(&hash).then_some(Some(nonce))
    });
    let attempts = attempts.into_inner();

    match found {
        Some(Some(nonce)) => {
            block.set_nonce(nonce);
            Ok(SealReport {
                nonce,
                attempts,
                hash: *block.hash(),
            })
        }
        Some(None) => Err(LedgerError::Cancelled { attempts }),
        None => Err(LedgerError::AttemptsExhausted { attempts }),
    }
}
