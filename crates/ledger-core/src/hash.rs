use crate::constants::HASH_SIZE;
use sha2::{Digest, Sha256};

pub type Hash = [u8; HASH_SIZE];

/// SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}

/// Upper-case hex with no separators, as blocks are printed.
pub fn to_hex_upper(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}
