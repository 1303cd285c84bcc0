use ledger_core::{Block, Chain, Difficulty};
use serde_json::Value;

pub fn build_chain(difficulty_hex: &str, payloads: &[Vec<u8>]) -> Chain {
    let difficulty = Difficulty::from_hex(difficulty_hex).expect("valid difficulty");
    let mut chain =
        Chain::new(difficulty, Block::new("Genesis Block")).expect("Failed to seal genesis");
    for payload in payloads {
        chain
            .add(Block::new(payload.clone()))
            .expect("Failed to seal block");
    }
    chain
}

/// Rewrites one serialized field without touching the stored hash, the way a
/// block edited at rest would come back.
#[allow(dead_code)]
pub fn tamper_field(block: &Block, field: &str, value: Value) -> Block {
    let mut json = serde_json::to_value(block).expect("Failed to serialize block");
    json[field] = value;
    serde_json::from_value(json).expect("Failed to deserialize tampered block")
}
