//! Point-in-time stock reconstruction.
//!
//! The cached product total only answers "now". Historical levels are rebuilt
//! by anchoring on the latest approved count before the cutoff, whose counted
//! quantity is trusted over the books, and replaying every later movement in
//! (timestamp, sequence) order up to the cutoff.

use chrono::{DateTime, Utc};
use stockbook_core::ProductId;
use stockbook_opname::{OpnameEvent, OpnameItem};
use stockbook_stock::LotKind;

use crate::state::LedgerState;

/// One ledger-affecting event for a single product, in replay form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Movement {
    pub at: DateTime<Utc>,
    pub seq: u64,
    pub effect: MovementEffect,
}

/// How a movement changes a running balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MovementEffect {
    /// Booked inflow, with the purchase document number when one exists.
    In { qty: i64, source: Option<String> },
    /// Booked outflow lot.
    Out { qty: i64 },
    /// Sold quantity, with the sale code.
    Sale { qty: i64, code: String },
    /// Approved count: sets the balance to the counted quantity.
    CountSet {
        actual: i64,
        delta: i64,
        number: String,
    },
}

impl MovementEffect {
    pub(crate) fn apply(&self, balance: i64) -> i64 {
        match self {
            Self::In { qty, .. } => balance + qty,
            Self::Out { qty } => balance - qty,
            Self::Sale { qty, .. } => balance - qty,
            Self::CountSet { actual, .. } => *actual,
        }
    }
}

/// Every movement touching the product, sorted by (timestamp, sequence).
pub(crate) fn collect_movements(state: &LedgerState, product_id: ProductId) -> Vec<Movement> {
    let mut movements = Vec::new();

    for lot in state.lots_for(product_id) {
        let effect = match lot.kind {
            LotKind::In => MovementEffect::In {
                qty: lot.original_qty,
                source: lot
                    .purchase_ref
                    .and_then(|id| state.purchase(id))
                    .map(|p| p.number.clone()),
            },
            LotKind::Out => MovementEffect::Out {
                qty: lot.original_qty,
            },
        };
        movements.push(Movement {
            at: lot.recorded_at,
            seq: lot.seq,
            effect,
        });
    }

    for stored in state.sales() {
        for line in stored.sale.lines() {
            if line.product_id() != product_id {
                continue;
            }
            movements.push(Movement {
                at: stored.sale.sold_at(),
                seq: stored.seq,
                effect: MovementEffect::Sale {
                    qty: line.quantity(),
                    code: stored.sale.code().to_string(),
                },
            });
        }
    }

    for event in state.opnames() {
        if !event.is_approved() {
            continue;
        }
        let Some(item) = event.item_for(product_id) else {
            continue;
        };
        movements.push(Movement {
            at: event.recorded_at,
            seq: event.seq,
            effect: MovementEffect::CountSet {
                actual: item.actual_qty,
                delta: item.delta(),
                number: event.number.clone(),
            },
        });
    }

    movements.sort_by_key(|m| (m.at, m.seq));
    movements
}

/// Stock level strictly before `cutoff`.
pub(crate) fn stock_before(state: &LedgerState, product_id: ProductId, cutoff: DateTime<Utc>) -> i64 {
    replay(state, product_id, cutoff, false)
}

/// Stock level through `cutoff`, cutoff instant included.
pub(crate) fn stock_through(
    state: &LedgerState,
    product_id: ProductId,
    cutoff: DateTime<Utc>,
) -> i64 {
    replay(state, product_id, cutoff, true)
}

fn replay(state: &LedgerState, product_id: ProductId, cutoff: DateTime<Utc>, inclusive: bool) -> i64 {
    let within = |at: DateTime<Utc>| if inclusive { at <= cutoff } else { at < cutoff };

    let (mut balance, anchor_ts) = match latest_anchor(state, product_id, &within) {
        Some((event, item)) => (item.actual_qty, Some(event.recorded_at)),
        None => (0, None),
    };

    for movement in collect_movements(state, product_id) {
        if !within(movement.at) {
            continue;
        }
        // Movements at or before the anchor instant are already baked into
        // the counted quantity.
        if let Some(anchor_ts) = anchor_ts {
            if movement.at <= anchor_ts {
                continue;
            }
        }
        balance = movement.effect.apply(balance);
    }

    balance
}

/// Latest approved count touching the product whose instant satisfies `in_bound`,
/// latest by (timestamp, sequence).
fn latest_anchor<'a>(
    state: &'a LedgerState,
    product_id: ProductId,
    in_bound: impl Fn(DateTime<Utc>) -> bool,
) -> Option<(&'a OpnameEvent, &'a OpnameItem)> {
    state
        .opnames()
        .iter()
        .filter(|e| e.is_approved() && in_bound(e.recorded_at))
        .filter_map(|e| e.item_for(product_id).map(|item| (e, item)))
        .max_by_key(|(e, _)| (e.recorded_at, e.seq))
}
