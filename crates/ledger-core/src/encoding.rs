//! Canonical hash preimage of a block.
//!
//! Fields are concatenated in a fixed order with no separators or length
//! prefixes: `payload ‖ nonce ‖ previous_hash ‖ timestamp`. Integers are
//! little-endian `u64`. Two different field splits can produce the same
//! bytes; that is an accepted property of the format.

const NONCE_SIZE: usize = 8;
const TIMESTAMP_SIZE: usize = 8;

pub fn encoded_len(payload_len: usize, previous_hash_len: usize) -> usize {
    payload_len + NONCE_SIZE + previous_hash_len + TIMESTAMP_SIZE
}

pub fn canonical_bytes(payload: &[u8], nonce: u64, previous_hash: &[u8], timestamp: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_len(payload.len(), previous_hash.len()));
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&nonce.to_le_bytes());
    bytes.extend_from_slice(previous_hash);
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes
}
