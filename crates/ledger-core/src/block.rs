use crate::constants::{HASH_SIZE, NO_PREDECESSOR};
use crate::encoding::canonical_bytes;
use crate::hash::{digest, to_hex_upper, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Capability set the sealer, validator and chain work through.
///
/// Setters recompute the stored hash, so a value built through this trait
/// never carries a stale hash. `compute_hash` never touches stored state.
pub trait Sealable: Send + Sync {
    fn payload(&self) -> &[u8];

    fn nonce(&self) -> u64;
    fn set_nonce(&mut self, nonce: u64);

    fn previous_hash(&self) -> &[u8];
    fn set_previous_hash(&mut self, previous_hash: Vec<u8>);

    fn timestamp(&self) -> u64;
    fn set_timestamp(&mut self, timestamp: u64);

    /// Cached digest.
    fn hash(&self) -> &Hash;

    /// Digest of the current fields with `nonce` substituted. Lets nonce
    /// search workers probe candidates through a shared reference.
    fn digest_with_nonce(&self, nonce: u64) -> Hash;

    fn compute_hash(&self) -> Hash {
        self.digest_with_nonce(self.nonce())
    }

    /// Overwrite the cached digest with a fresh one.
    fn refresh_hash(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(with = "hex::serde")]
    payload: Vec<u8>,
    nonce: u64,
    #[serde(with = "hex::serde")]
    previous_hash: Vec<u8>,
    timestamp: u64,
    #[serde(with = "hex::serde")]
    hash: Hash,
}

impl Block {
    /// Unsealed block stamped with the current time.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self::with_timestamp(payload, unix_now())
    }

    pub fn with_timestamp(payload: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        let mut block = Self {
            payload: payload.into(),
            nonce: 0,
            previous_hash: NO_PREDECESSOR.to_vec(),
            timestamp,
            hash: [0u8; HASH_SIZE],
        };
        block.refresh_hash();
        block
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

impl Sealable for Block {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.refresh_hash();
    }

    fn previous_hash(&self) -> &[u8] {
        &self.previous_hash
    }

    fn set_previous_hash(&mut self, previous_hash: Vec<u8>) {
        self.previous_hash = previous_hash;
        self.refresh_hash();
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
        self.refresh_hash();
    }

    fn hash(&self) -> &Hash {
        &self.hash
    }

    fn digest_with_nonce(&self, nonce: u64) -> Hash {
        digest(&canonical_bytes(
            &self.payload,
            nonce,
            &self.previous_hash,
            self.timestamp,
        ))
    }

    fn refresh_hash(&mut self) {
        self.hash = self.compute_hash();
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:\n {}\n{} {}",
            to_hex_upper(&self.hash),
            to_hex_upper(&self.previous_hash),
            self.nonce,
            self.timestamp
        )
    }
}

// Raw field writes that skip the hash refresh, for exercising the validator.
#[cfg(test)]
impl Block {
    pub(crate) fn tamper_payload(&mut self, payload: &[u8]) {
        self.payload = payload.to_vec();
    }

    pub(crate) fn tamper_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub(crate) fn tamper_previous_hash(&mut self, previous_hash: &[u8]) {
        self.previous_hash = previous_hash.to_vec();
    }

    pub(crate) fn tamper_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }
}
