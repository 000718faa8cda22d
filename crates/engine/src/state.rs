//! In-memory record store backing the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stockbook_core::{LedgerError, LedgerResult, OpnameId, ProductId, PurchaseId};
use stockbook_opname::OpnameEvent;
use stockbook_products::Product;
use stockbook_purchasing::Purchase;
use stockbook_sales::Sale;
use stockbook_stock::{StockLot, total_remaining};

/// A recorded sale together with its store-assigned insertion sequence.
///
/// Lots and counts carry their own `seq`; sales get theirs when stored so
/// replays can order same-instant events deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSale {
    pub seq: u64,
    pub sale: Sale,
}

/// Every record the engine owns, plus the counters that keep document numbers
/// and insertion sequences monotonic.
///
/// Pure data: mutation policy lives in the engine. The `insert_*` methods
/// hydrate records from external persistence; they check referential
/// consistency but run no business flow.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    products: HashMap<ProductId, Product>,
    lots: HashMap<ProductId, Vec<StockLot>>,
    sales: Vec<StoredSale>,
    purchases: Vec<Purchase>,
    opnames: Vec<OpnameEvent>,
    next_seq: u64,
    sale_counter: u64,
    purchase_counter: u64,
    opname_counter: u64,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Keeps fresh sequences strictly ahead of any hydrated record's.
    fn observe_seq(&mut self, seq: u64) {
        self.next_seq = self.next_seq.max(seq);
    }

    pub(crate) fn next_sale_code(&mut self) -> String {
        self.sale_counter += 1;
        format!("TX-{:05}", self.sale_counter)
    }

    pub(crate) fn next_purchase_number(&mut self) -> String {
        self.purchase_counter += 1;
        format!("PO-{:05}", self.purchase_counter)
    }

    pub(crate) fn next_opname_number(&mut self) -> String {
        self.opname_counter += 1;
        format!("SO-{:05}", self.opname_counter)
    }

    pub fn insert_product(&mut self, product: Product) -> LedgerResult<()> {
        if self.products.contains_key(&product.id) {
            return Err(LedgerError::validation(format!(
                "product {} is already registered",
                product.id
            )));
        }
        self.products.insert(product.id, product);
        Ok(())
    }

    pub fn product(&self, id: ProductId) -> LedgerResult<&Product> {
        self.products
            .get(&id)
            .ok_or(LedgerError::ProductNotFound(id))
    }

    pub(crate) fn product_mut(&mut self, id: ProductId) -> LedgerResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or(LedgerError::ProductNotFound(id))
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn lots_for(&self, product_id: ProductId) -> &[StockLot] {
        self.lots
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn lots_mut(&mut self, product_id: ProductId) -> &mut Vec<StockLot> {
        self.lots.entry(product_id).or_default()
    }

    /// Hydrate one lot. The product must already be registered; the stock
    /// cache is recomputed rather than trusted.
    pub fn insert_lot(&mut self, lot: StockLot) -> LedgerResult<()> {
        let product_id = lot.product_id;
        self.product(product_id)?;
        lot.check_invariants()?;
        self.observe_seq(lot.seq);
        self.lots.entry(product_id).or_default().push(lot);
        self.sync_stock_cache(product_id)?;
        Ok(())
    }

    /// Hydrate one sale. Lots are untouched; the drain already happened when
    /// the sale was first recorded.
    pub fn insert_sale(&mut self, sale: Sale) -> LedgerResult<()> {
        for line in sale.lines() {
            self.product(line.product_id())?;
        }
        let seq = self.alloc_seq();
        self.sales.push(StoredSale { seq, sale });
        Ok(())
    }

    pub(crate) fn push_sale(&mut self, seq: u64, sale: Sale) {
        self.sales.push(StoredSale { seq, sale });
    }

    pub fn sales(&self) -> &[StoredSale] {
        &self.sales
    }

    pub fn insert_purchase(&mut self, purchase: Purchase) -> LedgerResult<()> {
        self.product(purchase.product_id)?;
        self.purchases.push(purchase);
        Ok(())
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn purchase(&self, id: PurchaseId) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id == id)
    }

    pub fn insert_opname(&mut self, event: OpnameEvent) -> LedgerResult<()> {
        if self.opnames.iter().any(|e| e.id == event.id) {
            return Err(LedgerError::validation(format!(
                "count {} is already recorded",
                event.id
            )));
        }
        for item in &event.items {
            self.product(item.product_id)?;
        }
        self.observe_seq(event.seq);
        self.opnames.push(event);
        Ok(())
    }

    pub fn opnames(&self) -> &[OpnameEvent] {
        &self.opnames
    }

    pub fn opname(&self, id: OpnameId) -> LedgerResult<&OpnameEvent> {
        self.opnames
            .iter()
            .find(|e| e.id == id)
            .ok_or(LedgerError::CountNotFound(id))
    }

    pub(crate) fn opname_mut(&mut self, id: OpnameId) -> LedgerResult<&mut OpnameEvent> {
        self.opnames
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LedgerError::CountNotFound(id))
    }

    pub(crate) fn remove_opname(&mut self, id: OpnameId) -> LedgerResult<OpnameEvent> {
        let idx = self
            .opnames
            .iter()
            .position(|e| e.id == id)
            .ok_or(LedgerError::CountNotFound(id))?;
        Ok(self.opnames.remove(idx))
    }

    /// Recompute the product's cached stock from its lot remainders.
    pub(crate) fn sync_stock_cache(&mut self, product_id: ProductId) -> LedgerResult<i64> {
        let total = total_remaining(self.lots_for(product_id));
        let product = self.product_mut(product_id)?;
        product.stock = total;
        Ok(total)
    }

    /// Full-state consistency check: every lot within bounds, every cached
    /// stock equal to the sum of its lot remainders, no orphaned lots.
    pub fn check_invariants(&self) -> LedgerResult<()> {
        for product in self.products.values() {
            let mut total = 0;
            for lot in self.lots_for(product.id) {
                lot.check_invariants()?;
                if lot.product_id != product.id {
                    return Err(LedgerError::invariant(format!(
                        "lot {} filed under product {} belongs to {}",
                        lot.id, product.id, lot.product_id
                    )));
                }
                total += lot.remaining_qty;
            }
            if product.stock != total {
                return Err(LedgerError::invariant(format!(
                    "product {} caches stock {} but lots sum to {total}",
                    product.id, product.stock
                )));
            }
        }
        for product_id in self.lots.keys() {
            if !self.products.contains_key(product_id) {
                return Err(LedgerError::invariant(format!(
                    "lots recorded for unregistered product {product_id}"
                )));
            }
        }
        Ok(())
    }
}
