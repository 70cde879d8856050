// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into block structure, chain management, state queries and validation.

pub mod core;
pub use core::*;
