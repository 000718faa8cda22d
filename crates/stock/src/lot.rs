use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerError, LedgerResult, LotId, ProductId, PurchaseId};

/// Direction of a lot: goods booked onto the shelf or recorded leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotKind {
    In,
    Out,
}

/// A discrete batch of stock, the unit of costing-policy selection.
///
/// `original_qty` is everything ever booked into the lot; `remaining_qty` is
/// what is still on the shelf from it. Drains lower `remaining_qty` only, so
/// `0 <= remaining_qty <= original_qty` holds at all times. `out` lots record
/// externally-booked outflows: their `remaining_qty` stays 0 and replays
/// subtract their `original_qty`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: LotId,
    pub product_id: ProductId,
    pub kind: LotKind,
    /// Ordering key; same clock domain as sale and count timestamps.
    pub recorded_at: DateTime<Utc>,
    pub original_qty: i64,
    pub remaining_qty: i64,
    pub purchase_ref: Option<PurchaseId>,
    /// Store-assigned insertion sequence; tie-break for equal timestamps.
    pub seq: u64,
}

impl StockLot {
    /// A new inbound batch; starts with everything remaining.
    pub fn stock_in(
        id: LotId,
        product_id: ProductId,
        recorded_at: DateTime<Utc>,
        qty: i64,
        purchase_ref: Option<PurchaseId>,
        seq: u64,
    ) -> LedgerResult<Self> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        Ok(Self {
            id,
            product_id,
            kind: LotKind::In,
            recorded_at,
            original_qty: qty,
            remaining_qty: qty,
            purchase_ref,
            seq,
        })
    }

    /// An outbound movement booked by an external system (e.g. a write-off
    /// migrated from another ledger). Nothing remains to drain.
    pub fn stock_out(
        id: LotId,
        product_id: ProductId,
        recorded_at: DateTime<Utc>,
        qty: i64,
        seq: u64,
    ) -> LedgerResult<Self> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        Ok(Self {
            id,
            product_id,
            kind: LotKind::Out,
            recorded_at,
            original_qty: qty,
            remaining_qty: 0,
            purchase_ref: None,
            seq,
        })
    }

    /// Whether the policy selector may target this lot.
    pub fn is_open(&self) -> bool {
        self.kind == LotKind::In && self.remaining_qty > 0
    }

    /// Quantity bounds that must hold after every mutation. A violation is a
    /// programming error in the mutation path, never user input.
    pub fn check_invariants(&self) -> LedgerResult<()> {
        if self.remaining_qty < 0 {
            return Err(LedgerError::invariant(format!(
                "lot {} has negative remaining quantity {}",
                self.id, self.remaining_qty
            )));
        }
        if self.original_qty < 0 {
            return Err(LedgerError::invariant(format!(
                "lot {} has negative original quantity {}",
                self.id, self.original_qty
            )));
        }
        if self.remaining_qty > self.original_qty {
            return Err(LedgerError::invariant(format!(
                "lot {} remaining {} exceeds original {}",
                self.id, self.remaining_qty, self.original_qty
            )));
        }
        Ok(())
    }
}
