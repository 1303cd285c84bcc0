use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} out of range for chain of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no sealing nonce found within {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },

    #[error("sealing cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("block {index} hash does not match its contents")]
    TamperedBlock { index: usize },

    #[error("block {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
