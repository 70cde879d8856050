//! ChutCoin - a single-node proof-of-work ledger with signed transactions
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the chain, balance queries and integrity checks
//! - [`transaction`] - Transaction types and signature validation
//! - [`ledger`] - Lock-serialized shared handle and background mining
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work nonce search
//!
//! ## Cryptography
//! - [`crypto`] - Key pairs, signing and verification (secp256k1)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup for binaries

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod ledger;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
