use serde::{Deserialize, Serialize};

use stockbook_core::{LedgerError, LedgerResult, ProductId};

/// A catalog product as the ledger sees it: identity, pricing, and the cached
/// stock total.
///
/// Products are created by catalog management and registered into the ledger.
/// The ledger only ever writes the `stock` cache, which is kept equal to the
/// sum of the product's lot remainders after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    /// Unit cost in the smallest currency unit (e.g., cents).
    pub initial_price: i64,
    /// Unit selling price in the smallest currency unit.
    pub selling_price: i64,
    /// Cached stock total; always derivable by summing lot remainders.
    pub stock: i64,
}

impl Product {
    pub fn new(
        id: ProductId,
        sku: impl Into<String>,
        name: impl Into<String>,
        initial_price: i64,
        selling_price: i64,
    ) -> LedgerResult<Self> {
        let sku = sku.into();
        let name = name.into();

        if sku.trim().is_empty() {
            return Err(LedgerError::validation("SKU cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(LedgerError::validation("name cannot be empty"));
        }
        if initial_price < 0 {
            return Err(LedgerError::validation("initial_price cannot be negative"));
        }
        if selling_price < 0 {
            return Err(LedgerError::validation("selling_price cannot be negative"));
        }

        Ok(Self {
            id,
            sku,
            name,
            initial_price,
            selling_price,
            stock: 0,
        })
    }

    /// Margin per unit sold at list price.
    pub fn unit_margin(&self) -> i64 {
        self.selling_price - self.initial_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product_id() -> ProductId {
        ProductId::new()
    }

    #[test]
    fn new_product_starts_with_zero_stock() {
        let product = Product::new(test_product_id(), "SKU-001", "Arabica Beans", 1000, 1500)
            .unwrap();
        assert_eq!(product.stock, 0);
        assert_eq!(product.sku, "SKU-001");
        assert_eq!(product.name, "Arabica Beans");
    }

    #[test]
    fn rejects_empty_sku() {
        let err = Product::new(test_product_id(), "   ", "Arabica Beans", 1000, 1500)
            .unwrap_err();
        match err {
            LedgerError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_name() {
        let err = Product::new(test_product_id(), "SKU-001", "", 1000, 1500).unwrap_err();
        match err {
            LedgerError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_prices() {
        let err = Product::new(test_product_id(), "SKU-001", "Arabica Beans", -1, 1500)
            .unwrap_err();
        match err {
            LedgerError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }

        let err = Product::new(test_product_id(), "SKU-001", "Arabica Beans", 1000, -1)
            .unwrap_err();
        match err {
            LedgerError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn unit_margin_is_selling_minus_cost() {
        let product = Product::new(test_product_id(), "SKU-001", "Arabica Beans", 1000, 1500)
            .unwrap();
        assert_eq!(product.unit_margin(), 500);
    }
}
