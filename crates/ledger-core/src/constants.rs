pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Previous-hash value of a block that has no predecessor.
pub const NO_PREDECESSOR: [u8; 1] = [0x00];

pub const DEFAULT_DIFFICULTY_HEX: &str = "0000";
pub const GENESIS_PAYLOAD: &str = "Genesis Block";
pub const DEMO_BLOCKS: usize = 5;
