//! Error types for ChutCoin

use crate::transaction::Amount;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Signing key does not match the transaction sender")]
    IdentityMismatch,
    #[error("Transaction is not signed")]
    UnsignedTransaction,
    #[error("Transaction is missing a sender or recipient address")]
    MissingEndpoint,
    #[error("Transaction signature is invalid")]
    InvalidSignature,
    #[error("Transaction amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },
    #[error("Mining gave up after {attempts} attempts")]
    MiningBudgetExceeded { attempts: u64 },
    #[error("Mining was cancelled")]
    MiningCancelled,
    #[error("Mining worker exited without reporting a result")]
    MiningWorkerLost,
    #[error("Mining thread pool error: {0}")]
    ThreadPoolError(String),
    #[error("Invalid difficulty {0}: a SHA-256 hex digest has 64 characters")]
    InvalidDifficulty(u32),
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Logging setup failed: {0}")]
    LoggingError(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
