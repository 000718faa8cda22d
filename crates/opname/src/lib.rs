//! Stock-count (opname) domain module.
//!
//! Physical count events, their items, and the draft/approved/rejected state
//! machine, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod count;

pub use count::{AdjustmentReason, CountAdjustment, OpnameEvent, OpnameItem, OpnameStatus};
