use crate::config::{ChainConfig, Config};
use crate::crypto::Address;
use crate::error::ChainError;
use crate::miner::Miner;
use crate::transaction::types::now_millis;
use crate::transaction::{Amount, Transaction};
use std::sync::atomic::AtomicBool;

use super::block::Block;

/// A single authoritative in-memory chain plus its pool of admitted transactions.
///
/// The chain always starts with [`Block::genesis`] and never shrinks.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub(super) blocks: Vec<Block>,
    pub(super) pending: Vec<Transaction>,
    difficulty: u32,
    mining_reward: Amount,
    miner: Miner,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        let defaults = ChainConfig::default();
        Blockchain {
            blocks: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty: defaults.difficulty,
            mining_reward: defaults.mining_reward,
            miner: Miner::default(),
        }
    }

    pub fn with_config(config: &Config) -> Result<Self, ChainError> {
        config.validate()?;
        Ok(Blockchain {
            difficulty: config.chain.difficulty,
            mining_reward: config.chain.mining_reward,
            miner: Miner::from(&config.miner),
            ..Self::new()
        })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> Amount {
        self.mining_reward
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable view of the blocks. The chain length cannot change through it,
    /// but any edit is visible to [`Blockchain::is_chain_valid`].
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn last_block(&self) -> &Block {
        // `blocks` is private and starts with the genesis block.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Admits a transaction to the pending pool. A rejected transaction leaves the ledger untouched.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), ChainError> {
        if let Err(e) = self.check_admission(&tx) {
            tracing::warn!(tx = %tx.hash_str(), error = %e, "transaction rejected");
            return Err(e);
        }

        tracing::info!(
            tx = %tx.hash_str(),
            amount = tx.amount,
            "transaction added to pending pool"
        );
        self.pending.push(tx);
        Ok(())
    }

    fn check_admission(&self, tx: &Transaction) -> Result<(), ChainError> {
        tx.validate_for_admission()?;

        if let Some(sender) = &tx.sender {
            let available = self.balance_of(sender);
            if available < tx.amount {
                return Err(ChainError::InsufficientBalance {
                    available,
                    requested: tx.amount,
                });
            }
        }
        Ok(())
    }

    /// Bundles the pending pool plus a reward mint into a new mined block.
    pub fn mine_pending_transactions(
        &mut self,
        reward_address: &Address,
    ) -> Result<&Block, ChainError> {
        self.mine_pending_transactions_with_cancel(reward_address, &AtomicBool::new(false))
    }

    /// As [`Blockchain::mine_pending_transactions`], aborting with
    /// [`ChainError::MiningCancelled`] once `cancel` is raised. On any error
    /// the chain and the pending pool are unchanged.
    pub fn mine_pending_transactions_with_cancel(
        &mut self,
        reward_address: &Address,
        cancel: &AtomicBool,
    ) -> Result<&Block, ChainError> {
        let mut transactions = self.pending.clone();
        transactions.push(Transaction::mint(reward_address.clone(), self.mining_reward));

        let mut block = Block::new(
            now_millis(),
            transactions,
            self.last_block().hash.clone(),
        );
        block.mine_with(&self.miner, self.difficulty, cancel)?;

        self.blocks.push(block);
        self.pending.clear();
        tracing::info!(height = self.blocks.len() - 1, "block appended to chain");
        Ok(self.last_block())
    }
}
