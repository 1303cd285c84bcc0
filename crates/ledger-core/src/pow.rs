use crate::block::Sealable;
use crate::constants::HASH_SIZE;
use crate::error::{LedgerError, Result};
use crate::hash::Hash;
use crate::mine::search_parallel;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Byte prefix a sealed block's hash must start with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Difficulty(Vec<u8>);

impl Difficulty {
    /// Rejects prefixes longer than a digest, which no nonce could ever match.
    pub fn new(prefix: impl Into<Vec<u8>>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.len() > HASH_SIZE {
            return Err(LedgerError::InvalidArgument(format!(
                "difficulty prefix is {} bytes, a hash has only {HASH_SIZE}",
                prefix.len()
            )));
        }
        Ok(Self(prefix))
    }

    pub fn zero_bytes(count: usize) -> Result<Self> {
        Self::new(vec![0u8; count])
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::new(hex::decode(s)?)
    }

    pub fn prefix(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_met_by(&self, hash: &[u8]) -> bool {
        hash.len() >= self.0.len() && hash[..self.0.len()] == self.0[..]
    }
}

impl FromStr for Difficulty {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Shared flag that stops an in-flight nonce search. Once set it stays set.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealReport {
    pub nonce: u64,
    /// Hashes computed during the search.
    pub attempts: u64,
    pub hash: Hash,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SealMode {
    #[default]
    Sequential,
    Parallel,
}

/// Nonce search configuration. The default searches sequentially with no
/// attempt cap and no way to cancel, i.e. it runs until it succeeds.
#[derive(Clone, Debug, Default)]
pub struct Sealer {
    mode: SealMode,
    max_attempts: Option<u64>,
    cancel: Option<CancelFlag>,
}

impl Sealer {
    pub fn new(mode: SealMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn sequential() -> Self {
        Self::new(SealMode::Sequential)
    }

    pub fn parallel() -> Self {
        Self::new(SealMode::Parallel)
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(LedgerError::InvalidArgument(
                "max_attempts must be at least 1".into(),
            ));
        }
        self.max_attempts = Some(max_attempts);
        Ok(self)
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn mode(&self) -> SealMode {
        self.mode
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    /// Increment `block`'s nonce until its hash starts with `difficulty`.
    ///
    /// The nonce is bumped before every attempt, so the block's current nonce
    /// is never tried. An empty difficulty performs no search. On error the
    /// block is left self-consistent but unsealed and should be discarded.
    pub fn seal<B: Sealable>(&self, block: &mut B, difficulty: &Difficulty) -> Result<SealReport> {
        if difficulty.is_empty() {
            block.refresh_hash();
            return Ok(SealReport {
                nonce: block.nonce(),
                attempts: 0,
                hash: *block.hash(),
            });
        }

        debug!(
            mode = ?self.mode,
            %difficulty,
            start_nonce = block.nonce(),
            "sealing block"
        );
        let outcome = match self.mode {
            SealMode::Sequential => {
                search(block, difficulty, self.max_attempts, self.cancel.as_ref())
            }
            SealMode::Parallel => {
                search_parallel(block, difficulty, self.max_attempts, self.cancel.as_ref())
            }
        };

        match &outcome {
            Ok(report) => info!(
                "Sealed block with nonce {} after {} attempts, hash {}",
                report.nonce,
                report.attempts,
                hex::encode(report.hash)
            ),
            Err(err) => warn!(%err, "sealing stopped"),
        }
        outcome
    }
}

/// Seal with the default, unbounded sequential search.
pub fn seal<B: Sealable>(block: &mut B, difficulty: &Difficulty) -> Result<SealReport> {
    Sealer::default().seal(block, difficulty)
}

fn search<B: Sealable>(
    block: &mut B,
    difficulty: &Difficulty,
    max_attempts: Option<u64>,
    cancel: Option<&CancelFlag>,
) -> Result<SealReport> {
    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LedgerError::AttemptsExhausted { attempts });
        }
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return Err(LedgerError::Cancelled { attempts });
        }

        let nonce = block.nonce().wrapping_add(1);
        block.set_nonce(nonce);
        attempts += 1;

        if difficulty.is_met_by(block.hash()) {
            return Ok(SealReport {
                nonce,
                attempts,
                hash: *block.hash(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::validate::is_self_valid;

    const TS: u64 = 1_600_000_000;

    #[test]
    fn difficulty_rejects_unsatisfiable_prefix() {
        assert!(Difficulty::zero_bytes(HASH_SIZE).is_ok());
        let err = Difficulty::zero_bytes(HASH_SIZE + 1).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
    }

    #[test]
    fn difficulty_from_hex_example() {
        let difficulty: Difficulty = "0000".parse().unwrap();
        assert_eq!(difficulty.prefix(), &[0x00, 0x00]);
        assert_eq!(difficulty.to_string(), "0000");
        assert!(Difficulty::from_hex("").unwrap().is_empty());
        assert!(matches!(
            Difficulty::from_hex("zz"),
            Err(LedgerError::Hex(_))
        ));
        assert!(matches!(Difficulty::from_hex("000"), Err(LedgerError::Hex(_))));
    }

    #[test]
    fn difficulty_predicate_examples() {
        let difficulty = Difficulty::new(vec![0x00, 0x0F]).unwrap();
        assert!(difficulty.is_met_by(&[0x00, 0x0F, 0xFF]));
        assert!(difficulty.is_met_by(&[0x00, 0x0F]));
        assert!(!difficulty.is_met_by(&[0x00, 0x0E, 0xFF]));
        assert!(!difficulty.is_met_by(&[0x00]));
        assert!(Difficulty::default().is_met_by(&[]));
    }

    #[test]
    fn empty_difficulty_performs_no_search() {
        let mut block = Block::with_timestamp("Block 1", TS);
        let before = *block.hash();
        let report = seal(&mut block, &Difficulty::default()).unwrap();
        assert_eq!(report.attempts, 0);
        assert_eq!(report.nonce, 0);
        assert_eq!(block.nonce(), 0);
        assert_eq!(*block.hash(), before);
    }

    #[test]
    fn seal_one_zero_byte_example() {
        let mut block = Block::with_timestamp("Block 1", TS);
        let difficulty = Difficulty::zero_bytes(1).unwrap();
        let report = seal(&mut block, &difficulty).unwrap();

        assert_eq!(block.hash()[0], 0x00);
        assert_eq!(report.nonce, block.nonce());
        assert_eq!(report.hash, *block.hash());
        // nonce starts at 0 and moves by one per attempt
        assert_eq!(report.attempts, report.nonce);
        assert!(is_self_valid(&block));
    }

    #[test]
    fn seal_two_zero_bytes_example() {
        let mut block = Block::with_timestamp("Genesis Block", TS);
        let difficulty = Difficulty::zero_bytes(2).unwrap();
        seal(&mut block, &difficulty).unwrap();
        assert_eq!(&block.hash()[..2], &[0x00, 0x00]);
        assert!(difficulty.is_met_by(block.hash()));
        assert!(is_self_valid(&block));
    }

    #[test]
    fn seal_never_tries_current_nonce() {
        // any hash starts with itself, so the first attempt always wins
        let mut block = Block::with_timestamp("Block 1", TS);
        let next = block.digest_with_nonce(1);
        let difficulty = Difficulty::new(next.to_vec()).unwrap();
        let report = seal(&mut block, &difficulty).unwrap();
        assert_eq!(report.nonce, 1);
        assert_eq!(report.attempts, 1);
    }

    #[test]
    fn seal_gives_up_after_max_attempts() {
        let mut block = Block::with_timestamp("Block 1", TS);
        let sealer = Sealer::sequential().with_max_attempts(10).unwrap();
        let difficulty = Difficulty::zero_bytes(HASH_SIZE).unwrap();
        let err = sealer.seal(&mut block, &difficulty).unwrap_err();
        assert!(matches!(err, LedgerError::AttemptsExhausted { attempts: 10 }));
        assert_eq!(block.nonce(), 10);
        assert!(is_self_valid(&block));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        assert!(matches!(
            Sealer::sequential().with_max_attempts(0),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn cancelled_flag_stops_search() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let sealer = Sealer::sequential().with_cancel(cancel.clone());
        let mut block = Block::with_timestamp("Block 1", TS);
        let err = sealer
            .seal(&mut block, &Difficulty::zero_bytes(2).unwrap())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled { attempts: 0 }));
        assert_eq!(block.nonce(), 0);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn parallel_seal_two_zero_bytes() {
        let mut block = Block::with_timestamp("Block 1", TS);
        let difficulty = Difficulty::zero_bytes(2).unwrap();
        let report = Sealer::parallel().seal(&mut block, &difficulty).unwrap();

        assert!(difficulty.is_met_by(block.hash()));
        assert_eq!(report.nonce, block.nonce());
        assert_eq!(report.hash, *block.hash());
        assert!(report.nonce >= 1);
        assert!(report.attempts >= 1);
        assert!(is_self_valid(&block));
    }

    #[test]
    fn parallel_seal_respects_cap_and_cancel() {
        let difficulty = Difficulty::zero_bytes(HASH_SIZE).unwrap();

        let mut block = Block::with_timestamp("Block 1", TS);
        let sealer = Sealer::parallel().with_max_attempts(64).unwrap();
        let err = sealer.seal(&mut block, &difficulty).unwrap_err();
        assert!(matches!(err, LedgerError::AttemptsExhausted { attempts: 64 }));
        assert_eq!(block.nonce(), 0);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let sealer = Sealer::parallel().with_cancel(cancel);
        let err = sealer.seal(&mut block, &difficulty).unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled { .. }));
        assert_eq!(block.nonce(), 0);
    }
}
