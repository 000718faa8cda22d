//! Products domain module.
//!
//! Catalog products viewed through the stock ledger, implemented purely as
//! deterministic domain data (no IO, no HTTP, no storage).

pub mod product;

pub use product::Product;
