use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerError, LedgerResult, ProductId, SaleId};

/// One sold product on a sale document.
///
/// `total_cost` is the cost snapshot captured when the sale was recorded; it
/// is never recomputed from the current lot set, because historical valuation
/// reports depend on what the goods cost at the time they left the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    product_id: ProductId,
    quantity: i64,
    /// Line gross in the smallest currency unit.
    total_price: i64,
    /// Cost snapshot for the whole line, smallest currency unit.
    total_cost: i64,
    /// Line discount in the smallest currency unit.
    discount: i64,
}

impl SaleLine {
    pub fn new(
        product_id: ProductId,
        quantity: i64,
        total_price: i64,
        total_cost: i64,
        discount: i64,
    ) -> LedgerResult<Self> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        if total_price < 0 {
            return Err(LedgerError::validation("total_price cannot be negative"));
        }
        if total_cost < 0 {
            return Err(LedgerError::validation("total_cost cannot be negative"));
        }
        if discount < 0 {
            return Err(LedgerError::validation("discount cannot be negative"));
        }

        Ok(Self {
            product_id,
            quantity,
            total_price,
            total_cost,
            discount,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn total_price(&self) -> i64 {
        self.total_price
    }

    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    pub fn discount(&self) -> i64 {
        self.discount
    }
}

/// A sale document: header plus lines.
///
/// Append-only once recorded. Corrections are new compensating documents, not
/// edits, so stored cost snapshots stay trustworthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    /// Sequential document code, e.g. "TX-00042".
    code: String,
    sold_at: DateTime<Utc>,
    lines: Vec<SaleLine>,
}

impl Sale {
    pub fn new(
        id: SaleId,
        code: impl Into<String>,
        sold_at: DateTime<Utc>,
        lines: Vec<SaleLine>,
    ) -> LedgerResult<Self> {
        let code = code.into();

        if code.trim().is_empty() {
            return Err(LedgerError::validation("document code cannot be empty"));
        }
        if lines.is_empty() {
            return Err(LedgerError::validation("sale must have at least one line"));
        }

        Ok(Self {
            id,
            code,
            sold_at,
            lines,
        })
    }

    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn sold_at(&self) -> DateTime<Utc> {
        self.sold_at
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    /// Sum of line grosses.
    pub fn gross_amount(&self) -> i64 {
        self.lines.iter().map(|l| l.total_price).sum()
    }

    /// Sum of line cost snapshots.
    pub fn cost_amount(&self) -> i64 {
        self.lines.iter().map(|l| l.total_cost).sum()
    }

    /// Sum of line discounts.
    pub fn discount_amount(&self) -> i64 {
        self.lines.iter().map(|l| l.discount).sum()
    }
}
