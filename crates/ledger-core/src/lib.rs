//! Append-only hash-chained ledger sealed by proof of work.
//!
//! Each [`Block`] hashes a canonical encoding of its payload, nonce, previous
//! hash and timestamp. A [`Sealer`] searches nonces until the hash starts with
//! a [`Difficulty`] prefix, and a [`Chain`] links, seals and validates blocks.

pub mod block;
pub mod chain;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod hash;
mod mine;
pub mod pow;
pub mod validate;

pub use block::{Block, Sealable};
pub use chain::Chain;
pub use error::{LedgerError, Result};
pub use hash::{digest, Hash};
pub use pow::{seal, CancelFlag, Difficulty, SealMode, SealReport, Sealer};
pub use validate::{is_chain_valid, is_predecessor, is_self_valid, validate_chain};
