//! `stockbook-core` — ledger foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the ledger error taxonomy, and the reporting
//! date-range value type shared by every other crate.

pub mod error;
pub mod id;
pub mod range;

pub use error::{LedgerError, LedgerResult};
pub use id::{LotId, OpnameId, ProductId, PurchaseId, SaleId};
pub use range::DateRange;
