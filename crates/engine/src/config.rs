//! Engine configuration.

use chrono::{FixedOffset, Offset, Utc};
use stockbook_stock::CostingPolicy;

/// Static configuration for a [`StockLedger`](crate::StockLedger).
///
/// One ledger serves one tenant. Multi-tenant deployments construct one engine
/// per tenant, each with that tenant's costing policy and timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Lot selection policy for outbound stock.
    pub policy: CostingPolicy,
    /// Tenant-local offset used to turn calendar days into reporting ranges.
    pub timezone: FixedOffset,
}

impl LedgerConfig {
    pub fn new(policy: CostingPolicy, timezone: FixedOffset) -> Self {
        Self { policy, timezone }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            policy: CostingPolicy::default(),
            timezone: Utc.fix(),
        }
    }
}
