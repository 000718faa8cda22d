use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockbook_core::LedgerError;

use crate::lot::StockLot;

/// How the ledger chooses which lot absorbs a quantity change.
///
/// `Normal` shares FIFO's pick of the earliest open lot; the difference is
/// intent, not mechanics: additions keep topping up that same lot, so the
/// product behaves like one running balance instead of discrete batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostingPolicy {
    Fifo,
    Lifo,
    #[default]
    Normal,
}

impl fmt::Display for CostingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CostingPolicy::Fifo => "fifo",
            CostingPolicy::Lifo => "lifo",
            CostingPolicy::Normal => "normal",
        };
        f.write_str(s)
    }
}

impl FromStr for CostingPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(CostingPolicy::Fifo),
            "lifo" => Ok(CostingPolicy::Lifo),
            "normal" => Ok(CostingPolicy::Normal),
            other => Err(LedgerError::validation(format!(
                "unknown costing policy: {other}"
            ))),
        }
    }
}

/// Pick the index of the lot the policy designates for the next mutation.
///
/// Only open `in` lots are eligible. FIFO and Normal take the earliest
/// timestamp, LIFO the latest; the insertion sequence breaks timestamp ties.
/// Returns `None` when no lot is eligible: additions then create a fresh lot
/// and reductions clamp at zero.
pub fn select_lot(policy: CostingPolicy, lots: &[StockLot]) -> Option<usize> {
    let eligible = lots
        .iter()
        .enumerate()
        .filter(|(_, lot)| lot.is_open());

    match policy {
        CostingPolicy::Fifo | CostingPolicy::Normal => eligible
            .min_by_key(|(_, lot)| (lot.recorded_at, lot.seq))
            .map(|(i, _)| i),
        CostingPolicy::Lifo => eligible
            .max_by_key(|(_, lot)| (lot.recorded_at, lot.seq))
            .map(|(i, _)| i),
    }
}
