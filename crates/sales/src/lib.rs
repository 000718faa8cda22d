//! Sales domain module.
//!
//! Sale documents and their lines (with cost snapshots), implemented purely as
//! deterministic domain data (no IO, no HTTP, no storage).

pub mod sale;

pub use sale::{Sale, SaleLine};
