use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerError, LedgerResult, ProductId, PurchaseId};

/// A received purchase for one product.
///
/// The receipt is the document behind a stock-in lot: the lot keeps a
/// `purchase_ref` back to it, and stock-card rows show its number. Supplier
/// negotiation, ordering, and approval happen upstream; by the time the ledger
/// sees a purchase it is goods on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    /// Sequential document number, e.g. "PO-00012".
    pub number: String,
    pub product_id: ProductId,
    pub quantity: i64,
    pub received_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(
        id: PurchaseId,
        number: impl Into<String>,
        product_id: ProductId,
        quantity: i64,
        received_at: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let number = number.into();

        if number.trim().is_empty() {
            return Err(LedgerError::validation("document number cannot be empty"));
        }
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }

        Ok(Self {
            id,
            number,
            product_id,
            quantity,
            received_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        "2024-03-01T08:00:00Z".parse().unwrap()
    }

    #[test]
    fn builds_a_receipt() {
        let purchase = Purchase::new(
            PurchaseId::new(),
            "PO-00001",
            ProductId::new(),
            40,
            test_time(),
        )
        .unwrap();
        assert_eq!(purchase.quantity, 40);
        assert_eq!(purchase.number, "PO-00001");
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let err = Purchase::new(PurchaseId::new(), "PO-00001", ProductId::new(), 0, test_time())
            .unwrap_err();
        match err {
            LedgerError::InvalidQuantity(0) => {}
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_document_number() {
        let err = Purchase::new(PurchaseId::new(), "  ", ProductId::new(), 5, test_time())
            .unwrap_err();
        match err {
            LedgerError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }
}
