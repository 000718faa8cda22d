//! Tenant-scoped inventory ledger: mutations, reconstruction, valuation.
//!
//! Wires the domain crates together behind [`StockLedger`]. Mutations select
//! stock lots per the configured costing policy; reads reconstruct historical
//! levels and build the period valuation report. No IO: callers own
//! persistence and transport and hand records back via [`LedgerState`].

mod asof;

pub mod card;
pub mod config;
pub mod ledger;
pub mod report;
pub mod state;

pub use card::{StockCardEntry, StockCardEntryKind};
pub use config::LedgerConfig;
pub use ledger::{SaleLineDraft, StockLedger};
pub use report::{FooterTotals, ProductReport, ProductReportRow};
pub use state::{LedgerState, StoredSale};
