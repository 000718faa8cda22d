//! Per-product stock card: ordered movement history with a running balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockbook_core::{DateRange, LedgerResult, ProductId};

use crate::asof::{self, MovementEffect};
use crate::state::LedgerState;

/// Row kind on a stock card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockCardEntryKind {
    /// Carried-over balance at the start of the requested range.
    Beginning,
    /// Inbound lot.
    StockIn,
    /// Booked outflow lot.
    StockOut,
    /// Sold quantity.
    SaleOut,
    /// Approved count resetting the balance.
    CountAdjust,
}

/// One row on the stock card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCardEntry {
    pub at: DateTime<Utc>,
    pub kind: StockCardEntryKind,
    /// Signed quantity effect. Count rows carry their delta.
    pub quantity: i64,
    /// Document behind the movement.
    pub source: String,
    /// Running balance after the row.
    pub balance: i64,
}

pub(crate) fn build(
    state: &LedgerState,
    product_id: ProductId,
    range: Option<DateRange>,
) -> LedgerResult<Vec<StockCardEntry>> {
    state.product(product_id)?;

    let mut entries = Vec::new();
    let mut balance = 0;

    if let Some(range) = range {
        balance = asof::stock_before(state, product_id, range.start());
        entries.push(StockCardEntry {
            at: range.start(),
            kind: StockCardEntryKind::Beginning,
            quantity: balance,
            source: "beginning balance".to_string(),
            balance,
        });
    }

    for movement in asof::collect_movements(state, product_id) {
        if let Some(range) = range {
            if !range.contains(movement.at) {
                continue;
            }
        }
        let entry = match movement.effect {
            MovementEffect::In { qty, source } => {
                balance += qty;
                StockCardEntry {
                    at: movement.at,
                    kind: StockCardEntryKind::StockIn,
                    quantity: qty,
                    source: source.unwrap_or_else(|| "stock in".to_string()),
                    balance,
                }
            }
            MovementEffect::Out { qty } => {
                balance -= qty;
                StockCardEntry {
                    at: movement.at,
                    kind: StockCardEntryKind::StockOut,
                    quantity: -qty,
                    source: "stock out".to_string(),
                    balance,
                }
            }
            MovementEffect::Sale { qty, code } => {
                balance -= qty;
                StockCardEntry {
                    at: movement.at,
                    kind: StockCardEntryKind::SaleOut,
                    quantity: -qty,
                    source: code,
                    balance,
                }
            }
            MovementEffect::CountSet {
                actual,
                delta,
                number,
            } => {
                balance = actual;
                StockCardEntry {
                    at: movement.at,
                    kind: StockCardEntryKind::CountAdjust,
                    quantity: delta,
                    source: number,
                    balance,
                }
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}
