//! Stock lots and costing policy module.
//!
//! This crate contains the lot data model, the policy selector, and the pure
//! add/drain lot operations every ledger mutation is built from (no IO, no
//! locking, no storage).

pub mod lot;
pub mod mutate;
pub mod policy;

pub use lot::{LotKind, StockLot};
pub use mutate::{DrainOutcome, add_to_lots, drain_lots, total_remaining};
pub use policy::{CostingPolicy, select_lot};
