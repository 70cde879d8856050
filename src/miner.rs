//! Proof-of-work nonce search.
//!
//! The search is a pure function of a block template: it never touches the
//! chain, so an aborted search cannot leave a half-mined block anywhere.

use crate::blockchain::Block;
use crate::config::MinerConfig;
use crate::error::ChainError;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A SHA-256 digest has 64 hex characters.
pub const MAX_DIFFICULTY: u32 = 64;

/// Nonces handed to the thread pool per round.
const BATCH_SIZE: u64 = 4096;

/// How often the sequential search polls the cancellation flag.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// True if the first `difficulty` hex characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
}

#[derive(Debug, Clone)]
pub struct Miner {
    pub threads: usize,
    pub max_attempts: Option<u64>,
    /// Built on the first parallel search, then shared by every clone.
    pool: Arc<OnceCell<ThreadPool>>,
}

impl Default for Miner {
    fn default() -> Self {
        Miner::new(1, None)
    }
}

impl From<&MinerConfig> for Miner {
    fn from(config: &MinerConfig) -> Self {
        Miner::new(config.threads, config.max_attempts)
    }
}

impl Miner {
    pub fn new(threads: usize, max_attempts: Option<u64>) -> Self {
        Miner {
            threads: threads.max(1),
            max_attempts,
            pool: Arc::new(OnceCell::new()),
        }
    }

    fn pool(&self) -> Result<&ThreadPool, ChainError> {
        self.pool.get_or_try_init(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .thread_name(|i| format!("chutcoin-miner-{}", i))
                .build()
                .map_err(|e| ChainError::ThreadPoolError(e.to_string()))
        })
    }

    /// Finds the smallest nonce, starting at `template.nonce`, whose block hash meets `difficulty`.
    pub fn find_nonce(
        &self,
        template: &Block,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<u64, ChainError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }

        if self.threads <= 1 {
            self.find_nonce_sequential(template, difficulty, cancel)
        } else {
            self.find_nonce_parallel(template, difficulty, cancel)
        }
    }

    fn find_nonce_sequential(
        &self,
        template: &Block,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<u64, ChainError> {
        let prefix = template.prefix_hasher();
        let mut nonce = template.nonce;
        let mut attempts: u64 = 0;

        loop {
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(ChainError::MiningBudgetExceeded { attempts });
                }
            }
            if attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(ChainError::MiningCancelled);
            }

            if meets_difficulty(&Block::hash_with_nonce(&prefix, nonce), difficulty) {
                tracing::debug!(nonce, attempts = attempts + 1, "nonce found");
                return Ok(nonce);
            }

            attempts += 1;
            nonce = nonce
                .checked_add(1)
                .ok_or(ChainError::MiningBudgetExceeded { attempts })?;
        }
    }

    fn find_nonce_parallel(
        &self,
        template: &Block,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<u64, ChainError> {
        let pool = self.pool()?;
        let prefix = template.prefix_hasher();

        pool.install(|| {
            let mut start = template.nonce;
            let mut attempts: u64 = 0;

            loop {
                if cancel.load(Ordering::Relaxed) {
                    return Err(ChainError::MiningCancelled);
                }

                let mut batch = BATCH_SIZE;
                if let Some(max) = self.max_attempts {
                    if attempts >= max {
                        return Err(ChainError::MiningBudgetExceeded { attempts });
                    }
                    batch = batch.min(max - attempts);
                }

                let end = start.saturating_add(batch);
                // find_first keeps the result identical to the sequential search.
                let found = (start..end).into_par_iter().find_first(|&nonce| {
                    meets_difficulty(&Block::hash_with_nonce(&prefix, nonce), difficulty)
                });
                if let Some(nonce) = found {
                    tracing::debug!(nonce, threads = self.threads, "nonce found");
                    return Ok(nonce);
                }

                attempts += end - start;
                if end == u64::MAX {
                    return Err(ChainError::MiningBudgetExceeded { attempts });
                }
                start = end;
            }
        })
    }
}
