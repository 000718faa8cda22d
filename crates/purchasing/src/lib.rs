//! Purchasing domain module (received goods).
//!
//! This crate contains the purchase receipt record behind stock-in lots,
//! implemented purely as deterministic domain data (no IO, no HTTP, no
//! storage).

pub mod receipt;

pub use receipt::Purchase;
