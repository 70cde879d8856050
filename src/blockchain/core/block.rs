use crate::error::ChainError;
use crate::miner::{meets_difficulty, Miner};
use crate::transaction::Transaction;
use sha2::{Digest, Sha256};
use std::sync::atomic::AtomicBool;

/// Previous-hash value carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// 2022-01-01T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_640_995_200_000;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    /// Hex SHA-256 of the block contents, including the nonce.
    pub hash: String,
}

impl Block {
    pub fn new(timestamp: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let mut block = Block {
            previous_hash,
            timestamp,
            transactions,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.digest();
        block
    }

    /// The fixed first block of every chain.
    pub fn genesis() -> Self {
        Block::new(GENESIS_TIMESTAMP, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Hasher primed with everything except the nonce.
    pub(crate) fn prefix_hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update((self.previous_hash.len() as u64).to_le_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.update_block_hasher(&mut hasher);
        }
        hasher
    }

    pub(crate) fn hash_with_nonce(prefix: &Sha256, nonce: u64) -> String {
        let mut hasher = prefix.clone();
        hasher.update(nonce.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recomputes the content hash from the current fields.
    pub fn digest(&self) -> String {
        Self::hash_with_nonce(&self.prefix_hasher(), self.nonce)
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    /// Searches for a nonce satisfying `difficulty` and stores it with the resulting hash.
    pub fn mine(&mut self, difficulty: u32) -> Result<(), ChainError> {
        self.mine_with(&Miner::default(), difficulty, &AtomicBool::new(false))
    }

    pub fn mine_with(
        &mut self,
        miner: &Miner,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<(), ChainError> {
        let nonce = miner.find_nonce(self, difficulty, cancel)?;
        self.nonce = nonce;
        self.hash = self.digest();
        tracing::info!(hash = %self.hash, nonce, "block mined");
        Ok(())
    }

    /// True iff every transaction verifies. Stops at the first invalid one.
    pub fn contains_valid_transactions(&self) -> Result<bool, ChainError> {
        for tx in &self.transactions {
            if !tx.is_valid()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
