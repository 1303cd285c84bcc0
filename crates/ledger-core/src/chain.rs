use crate::block::{Block, Sealable};
use crate::error::{LedgerError, Result};
use crate::pow::{Difficulty, SealReport, Sealer};
use crate::validate::{is_chain_valid, validate_chain};
use std::mem;
use tracing::info;

/// In-memory chain that exclusively owns its blocks.
#[derive(Clone, Debug)]
pub struct Chain<B: Sealable = Block> {
    blocks: Vec<B>,
    difficulty: Difficulty,
    sealer: Sealer,
}

impl<B: Sealable> Chain<B> {
    /// Seal `genesis` with `difficulty` and start a chain with it.
    pub fn new(difficulty: Difficulty, genesis: B) -> Result<Self> {
        Self::with_sealer(difficulty, genesis, Sealer::default())
    }

    pub fn with_sealer(difficulty: Difficulty, mut genesis: B, sealer: Sealer) -> Result<Self> {
        sealer.seal(&mut genesis, &difficulty)?;
        info!("genesis sealed, difficulty {difficulty}");
        Ok(Self {
            blocks: vec![genesis],
            difficulty,
            sealer,
        })
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Applies to blocks added from now on; sealed blocks are left alone.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!("difficulty {} -> {}", self.difficulty, difficulty);
        self.difficulty = difficulty;
    }

    pub fn sealer(&self) -> &Sealer {
        &self.sealer
    }

    /// Link `block` to the current tip, seal it and append it.
    ///
    /// The link is set before the nonce search so the search covers the final
    /// previous hash. If sealing fails the block is dropped and the chain is
    /// unchanged.
    pub fn add(&mut self, mut block: B) -> Result<SealReport> {
        if let Some(last) = self.blocks.last() {
            block.set_previous_hash(last.hash().to_vec());
        }
        let report = self.sealer.seal(&mut block, &self.difficulty)?;
        self.blocks.push(block);
        info!(height = self.blocks.len() - 1, nonce = report.nonce, "block appended");
        Ok(report)
    }

    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.blocks)
    }

    /// Like `is_valid`, but names the first offending block.
    pub fn validate(&self) -> Result<()> {
        validate_chain(&self.blocks)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&B> {
        self.blocks.get(index).ok_or(LedgerError::IndexOutOfRange {
            index,
            len: self.blocks.len(),
        })
    }

    /// Overwrite the block at `index`, returning the old one. No relinking or
    /// resealing happens; `is_valid` reports whatever this leaves behind.
    pub fn replace(&mut self, index: usize, block: B) -> Result<B> {
        let len = self.blocks.len();
        let slot = self
            .blocks
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, len })?;
        Ok(mem::replace(slot, block))
    }

    pub fn last(&self) -> Option<&B> {
        self.blocks.last()
    }

    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, B> {
        self.blocks.iter()
    }
}

impl<'a, B: Sealable> IntoIterator for &'a Chain<B> {
    type Item = &'a B;
    type IntoIter = std::slice::Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
