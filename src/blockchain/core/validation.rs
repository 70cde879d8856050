use crate::error::ChainError;

use super::block::Block;
use super::chain::Blockchain;

impl Blockchain {
    /// Structural integrity: genesis matches, every block links to its
    /// predecessor, and every stored hash equals a fresh recomputation.
    ///
    /// Transaction signatures and proof-of-work are not rechecked here; see
    /// [`Blockchain::validate_chain`].
    pub fn is_chain_valid(&self) -> bool {
        self.check_structure().is_ok()
    }

    /// Full audit. Runs the structural checks, then for every mined block
    /// checks the proof-of-work against the ledger's difficulty and
    /// re-verifies every transaction signature.
    pub fn validate_chain(&self) -> Result<(), ChainError> {
        self.check_structure()?;

        for (height, block) in self.blocks.iter().enumerate().skip(1) {
            if !block.meets_difficulty(self.difficulty()) {
                return Err(ChainError::InvalidBlock(format!(
                    "Block {} hash {} does not meet difficulty {}",
                    height,
                    block.hash,
                    self.difficulty()
                )));
            }

            let valid = block.contains_valid_transactions().map_err(|e| {
                ChainError::InvalidBlock(format!("Block {} transaction check failed: {}", height, e))
            })?;
            if !valid {
                return Err(ChainError::InvalidBlock(format!(
                    "Block {} contains a transaction with an invalid signature",
                    height
                )));
            }
        }
        Ok(())
    }

    fn check_structure(&self) -> Result<(), ChainError> {
        match self.blocks.first() {
            Some(first) if *first == Block::genesis() => {}
            _ => {
                return Err(ChainError::InvalidBlock(
                    "Genesis block does not match the canonical genesis".to_string(),
                ))
            }
        }

        for (height, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let height = height + 1;

            if current.previous_hash != previous.hash {
                return Err(ChainError::InvalidBlock(format!(
                    "Invalid previous block hash at height {}. Expected {}, but got {}.",
                    height, previous.hash, current.previous_hash
                )));
            }

            let recomputed = current.digest();
            if current.hash != recomputed {
                return Err(ChainError::InvalidBlock(format!(
                    "Hash mismatch at height {}. Stored {}, recomputed {}.",
                    height, current.hash, recomputed
                )));
            }
        }
        Ok(())
    }
}
