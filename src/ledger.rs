//! Thread-safe ledger handle.
//!
//! Every mutation takes the single write lock around the chain and pending
//! pool. A mining round keeps that lock for its whole search, so the pending
//! pool it bundles cannot change underneath it and no other mutation can
//! interleave with it.

use crate::blockchain::{Block, Blockchain};
use crate::config::Config;
use crate::crypto::Address;
use crate::error::ChainError;
use crate::transaction::{Amount, Transaction};
use crossbeam_channel::{bounded, Receiver};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Blockchain>>,
}

impl SharedLedger {
    pub fn new(chain: Blockchain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    pub fn with_config(config: &Config) -> Result<Self, ChainError> {
        Ok(Self::new(Blockchain::with_config(config)?))
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<(), ChainError> {
        self.inner.write().add_transaction(tx)
    }

    /// Mines on the calling thread and returns a copy of the appended block.
    pub fn mine_pending_transactions(&self, reward_address: &Address) -> Result<Block, ChainError> {
        self.inner
            .write()
            .mine_pending_transactions(reward_address)
            .cloned()
    }

    /// Runs a mining round on a worker thread. The result arrives on the job's channel.
    pub fn spawn_mining(&self, reward_address: Address) -> MiningJob {
        let (sender, receiver) = bounded(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let inner = Arc::clone(&self.inner);
        let flag = Arc::clone(&cancel);

        thread::spawn(move || {
            let result = inner
                .write()
                .mine_pending_transactions_with_cancel(&reward_address, &flag)
                .cloned();
            if let Err(e) = &result {
                tracing::warn!(error = %e, "background mining round failed");
            }
            // The receiver may already be gone; the chain is updated either way.
            let _ = sender.send(result);
        });

        MiningJob { receiver, cancel }
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.inner.read().balance_of(address)
    }

    pub fn history_of(&self, address: &Address) -> Vec<Transaction> {
        self.inner.read().history_of(address)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.inner.read().is_chain_valid()
    }

    pub fn validate_chain(&self) -> Result<(), ChainError> {
        self.inner.read().validate_chain()
    }

    pub fn height(&self) -> usize {
        self.inner.read().blocks().len() - 1
    }

    pub fn pending_len(&self) -> usize {
        self.inner.read().pending_transactions().len()
    }

    /// Clones the current chain state.
    pub fn snapshot(&self) -> Blockchain {
        self.inner.read().clone()
    }
}

/// Handle to a mining round running in the background.
pub struct MiningJob {
    receiver: Receiver<Result<Block, ChainError>>,
    cancel: Arc<AtomicBool>,
}

impl MiningJob {
    /// Asks the search to stop. The chain is left untouched if it has not finished yet.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Blocks until the round finishes.
    pub fn wait(self) -> Result<Block, ChainError> {
        self.receiver
            .recv()
            .map_err(|_| ChainError::MiningWorkerLost)?
    }

    pub fn try_result(&self) -> Option<Result<Block, ChainError>> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn quick_ledger() -> SharedLedger {
        let mut config = Config::default();
        config.chain.difficulty = 1;
        SharedLedger::with_config(&config).unwrap()
    }

    #[test]
    fn test_background_mining_appends_block() {
        let ledger = quick_ledger();
        let miner = KeyPair::generate().address();

        let block = ledger.spawn_mining(miner.clone()).wait().unwrap();
        assert!(block.meets_difficulty(1));
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.balance_of(&miner), 100);
        assert!(ledger.is_chain_valid());
    }

    #[test]
    fn test_cancelled_background_mining_leaves_chain_untouched() {
        let mut config = Config::default();
        config.chain.difficulty = 64;
        let ledger = SharedLedger::with_config(&config).unwrap();

        let job = ledger.spawn_mining(Address::new("miner"));
        job.cancel();
        assert_eq!(job.wait(), Err(ChainError::MiningCancelled));
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_wait_reports_lost_worker() {
        let (sender, receiver) = bounded(1);
        drop(sender);
        let job = MiningJob {
            receiver,
            cancel: Arc::new(AtomicBool::new(false)),
        };
        assert_eq!(job.wait(), Err(ChainError::MiningWorkerLost));
    }

    #[test]
    fn test_concurrent_submissions_are_serialized() {
        let ledger = quick_ledger();
        let alice = KeyPair::generate();
        ledger.mine_pending_transactions(&alice.address()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ledger = ledger.clone();
                let alice = alice.clone();
                thread::spawn(move || {
                    let mut tx = Transaction::transfer(
                        alice.address(),
                        Address::new(format!("bob-{}", i)),
                        100,
                    );
                    tx.sign(&alice).unwrap();
                    ledger.add_transaction(tx)
                })
            })
            .collect();

        // Balance checks only see confirmed blocks, so every submission is
        // admitted; mining then bundles them all in one snapshot.
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(ledger.pending_len(), 4);

        let block = ledger.mine_pending_transactions(&alice.address()).unwrap();
        assert_eq!(block.transactions.len(), 5);
        assert_eq!(ledger.pending_len(), 0);
        assert!(ledger.is_chain_valid());
    }
}
