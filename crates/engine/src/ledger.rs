//! The stock ledger service.
//!
//! One instance per tenant. A single `RwLock` over the whole state keeps
//! multi-record mutations (count approval, multi-line sales) atomic without a
//! transaction layer: writers validate everything fallible up front, then
//! apply.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stockbook_core::{
    DateRange, LedgerError, LedgerResult, OpnameId, ProductId, PurchaseId, SaleId,
};
use stockbook_opname::{AdjustmentReason, OpnameEvent, OpnameItem};
use stockbook_products::Product;
use stockbook_purchasing::Purchase;
use stockbook_sales::{Sale, SaleLine};
use stockbook_stock::{CostingPolicy, DrainOutcome, StockLot, add_to_lots, drain_lots};

use crate::asof;
use crate::card::{self, StockCardEntry};
use crate::config::LedgerConfig;
use crate::report::{self, ProductReport};
use crate::state::LedgerState;

/// One line of a sale before pricing defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineDraft {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Line gross override. `None` defaults to `quantity × selling_price`.
    pub total_price: Option<i64>,
    pub discount: i64,
}

impl SaleLineDraft {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            total_price: None,
            discount: 0,
        }
    }
}

/// Tenant-scoped inventory ledger: stock mutations under a costing policy,
/// count reconciliation, and period valuation reads.
///
/// Every operation takes its business timestamp explicitly; the engine never
/// reads the wall clock, which keeps replays and tests deterministic.
pub struct StockLedger {
    config: LedgerConfig,
    state: RwLock<LedgerState>,
}

impl StockLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(LedgerState::new()),
        }
    }

    /// Wrap a hydrated state, verifying its invariants first.
    pub fn with_state(config: LedgerConfig, state: LedgerState) -> LedgerResult<Self> {
        state.check_invariants()?;
        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::invariant("ledger state lock poisoned"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::invariant("ledger state lock poisoned"))
    }

    pub fn register_product(
        &self,
        sku: impl Into<String>,
        name: impl Into<String>,
        initial_price: i64,
        selling_price: i64,
    ) -> LedgerResult<Product> {
        let product = Product::new(ProductId::new(), sku, name, initial_price, selling_price)?;
        let mut state = self.write()?;
        state.insert_product(product.clone())?;
        tracing::debug!(product = %product.id, sku = %product.sku, "registered product");
        Ok(product)
    }

    /// Register a product and book its opening stock in one step.
    pub fn register_product_with_opening(
        &self,
        sku: impl Into<String>,
        name: impl Into<String>,
        initial_price: i64,
        selling_price: i64,
        opening_qty: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<Product> {
        if opening_qty < 0 {
            return Err(LedgerError::InvalidQuantity(opening_qty));
        }
        let product = Product::new(ProductId::new(), sku, name, initial_price, selling_price)?;
        let id = product.id;
        let mut state = self.write()?;
        state.insert_product(product)?;
        if opening_qty > 0 {
            apply_add(&mut state, id, opening_qty, at, None, self.config.policy)?;
        }
        Ok(state.product(id)?.clone())
    }

    pub fn product(&self, id: ProductId) -> LedgerResult<Product> {
        Ok(self.read()?.product(id)?.clone())
    }

    /// Every registered product, sorted by SKU.
    pub fn products(&self) -> LedgerResult<Vec<Product>> {
        let state = self.read()?;
        let mut products: Vec<Product> = state.products().cloned().collect();
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(products)
    }

    /// Book `qty` units in. The quantity lands in a lot recorded at `at`: an
    /// open lot from that same instant absorbs it, any other addition gets a
    /// fresh lot (always fresh with a purchase reference).
    pub fn add_stock(
        &self,
        product_id: ProductId,
        qty: i64,
        at: DateTime<Utc>,
        purchase_ref: Option<PurchaseId>,
    ) -> LedgerResult<StockLot> {
        let mut state = self.write()?;
        apply_add(&mut state, product_id, qty, at, purchase_ref, self.config.policy)
    }

    /// Take `qty` units out, draining policy-selected lots and spilling into
    /// the next until satisfied. When the books hold fewer units than
    /// requested, the total floors at zero and the shortfall is reported in
    /// the outcome rather than treated as an error.
    pub fn reduce_stock(
        &self,
        product_id: ProductId,
        qty: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<DrainOutcome> {
        let mut state = self.write()?;
        apply_reduce(&mut state, product_id, qty, at, self.config.policy)
    }

    /// Record a received purchase: a numbered document plus its own stock lot.
    pub fn record_purchase(
        &self,
        product_id: ProductId,
        qty: i64,
        at: DateTime<Utc>,
    ) -> LedgerResult<Purchase> {
        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity(qty));
        }
        let mut state = self.write()?;
        state.product(product_id)?;
        let number = state.next_purchase_number();
        let purchase = Purchase::new(PurchaseId::new(), number, product_id, qty, at)?;
        apply_add(
            &mut state,
            product_id,
            qty,
            at,
            Some(purchase.id),
            self.config.policy,
        )?;
        state.insert_purchase(purchase.clone())?;
        tracing::debug!(purchase = %purchase.number, product = %product_id, qty, "recorded purchase");
        Ok(purchase)
    }

    /// Record a sale: validates every line, snapshots costs from the catalog,
    /// then drains stock per line. All lines are checked before any lot is
    /// touched, so a bad line leaves the ledger untouched.
    pub fn record_sale(&self, at: DateTime<Utc>, drafts: &[SaleLineDraft]) -> LedgerResult<Sale> {
        if drafts.is_empty() {
            return Err(LedgerError::validation("a sale needs at least one line"));
        }
        let mut state = self.write()?;

        let mut lines = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let product = state.product(draft.product_id)?;
            let total_price = draft
                .total_price
                .unwrap_or(draft.quantity * product.selling_price);
            let total_cost = draft.quantity * product.initial_price;
            lines.push(SaleLine::new(
                draft.product_id,
                draft.quantity,
                total_price,
                total_cost,
                draft.discount,
            )?);
        }

        let code = state.next_sale_code();
        let sale = Sale::new(SaleId::new(), code, at, lines)?;
        for line in sale.lines() {
            apply_reduce(&mut state, line.product_id(), line.quantity(), at, self.config.policy)?;
        }
        let seq = state.alloc_seq();
        state.push_sale(seq, sale.clone());
        tracing::debug!(sale = %sale.code(), lines = sale.lines().len(), "recorded sale");
        Ok(sale)
    }

    /// Open a draft stock count.
    pub fn open_count(&self, at: DateTime<Utc>) -> LedgerResult<OpnameEvent> {
        let mut state = self.write()?;
        let number = state.next_opname_number();
        let seq = state.alloc_seq();
        let event = OpnameEvent::draft(OpnameId::new(), number, at, seq)?;
        state.insert_opname(event.clone())?;
        Ok(event)
    }

    /// Count one product into a draft. The ledger's current belief is captured
    /// here; the delta does not touch stock until approval.
    pub fn submit_count(
        &self,
        count_id: OpnameId,
        product_id: ProductId,
        actual_qty: i64,
        reason: AdjustmentReason,
        evidence_ref: Option<String>,
    ) -> LedgerResult<OpnameItem> {
        let mut state = self.write()?;
        let system_qty = state.product(product_id)?.stock;
        let item = OpnameItem::new(product_id, system_qty, actual_qty, reason, evidence_ref)?;
        state.opname_mut(count_id)?.push_item(item.clone())?;
        Ok(item)
    }

    /// Approve a draft count and apply every item's delta, in ascending
    /// product-id order. Approving an approved count is a no-op (`Ok(false)`);
    /// a rejected one cannot be approved.
    ///
    /// Adjustments are timestamped at the count's `recorded_at`, so replays
    /// that anchor on this count do not see them twice.
    pub fn approve_count(&self, count_id: OpnameId, at: DateTime<Utc>) -> LedgerResult<bool> {
        let mut state = self.write()?;

        let event = state.opname(count_id)?;
        let recorded_at = event.recorded_at;
        let number = event.number.clone();
        let adjustments = event.adjustments();
        for adjustment in &adjustments {
            state.product(adjustment.product_id)?;
        }

        if !state.opname_mut(count_id)?.mark_approved(at)? {
            return Ok(false);
        }

        for adjustment in adjustments {
            if adjustment.delta > 0 {
                apply_add(
                    &mut state,
                    adjustment.product_id,
                    adjustment.delta,
                    recorded_at,
                    None,
                    self.config.policy,
                )?;
            } else if adjustment.delta < 0 {
                apply_reduce(
                    &mut state,
                    adjustment.product_id,
                    -adjustment.delta,
                    recorded_at,
                    self.config.policy,
                )?;
            }
        }
        tracing::info!(count = %number, "approved stock count");
        Ok(true)
    }

    /// Reject a draft count. Terminal; no ledger effect.
    pub fn reject_count(&self, count_id: OpnameId) -> LedgerResult<()> {
        let mut state = self.write()?;
        state.opname_mut(count_id)?.mark_rejected()
    }

    /// Delete a count. An approved count's quantities are already in the
    /// books, so each item's counted quantity is booked back in at the
    /// deletion instant before the record goes away; history before the
    /// deletion replays unchanged. Not a true undo: the original lot
    /// selection is not restored.
    pub fn delete_count(&self, count_id: OpnameId, at: DateTime<Utc>) -> LedgerResult<OpnameEvent> {
        let mut state = self.write()?;

        let event = state.opname(count_id)?;
        if event.is_approved() {
            let items: Vec<(ProductId, i64)> = event
                .items
                .iter()
                .map(|item| (item.product_id, item.actual_qty))
                .collect();
            for (product_id, _) in &items {
                state.product(*product_id)?;
            }
            tracing::warn!(count = %event.number, "deleting an approved count; booking counted quantities back in");
            for (product_id, actual_qty) in items {
                if actual_qty > 0 {
                    apply_add(&mut state, product_id, actual_qty, at, None, self.config.policy)?;
                }
            }
        }
        state.remove_opname(count_id)
    }

    /// A count's current snapshot.
    pub fn count(&self, count_id: OpnameId) -> LedgerResult<OpnameEvent> {
        Ok(self.read()?.opname(count_id)?.clone())
    }

    /// Stock level for a product strictly before `cutoff`, reconstructed from
    /// history (anchored on the latest approved count before the cutoff).
    pub fn stock_as_of(&self, product_id: ProductId, cutoff: DateTime<Utc>) -> LedgerResult<i64> {
        let state = self.read()?;
        state.product(product_id)?;
        Ok(asof::stock_before(&state, product_id, cutoff))
    }

    /// Period valuation report over an explicit instant range.
    pub fn product_report(&self, range: DateRange) -> LedgerResult<ProductReport> {
        let state = self.read()?;
        Ok(report::build(&state, range))
    }

    /// Period valuation report over whole tenant-local calendar days.
    pub fn product_report_for_days(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> LedgerResult<ProductReport> {
        let range = DateRange::calendar_days(first, last, self.config.timezone)?;
        self.product_report(range)
    }

    /// Movement history for one product with a running balance. With a range,
    /// a beginning row carries the balance into the first day.
    pub fn stock_card(
        &self,
        product_id: ProductId,
        range: Option<DateRange>,
    ) -> LedgerResult<Vec<StockCardEntry>> {
        let state = self.read()?;
        card::build(&state, product_id, range)
    }

    /// Clone of the full state, for persistence or inspection.
    pub fn snapshot(&self) -> LedgerResult<LedgerState> {
        Ok(self.read()?.clone())
    }

    pub fn check_invariants(&self) -> LedgerResult<()> {
        self.read()?.check_invariants()
    }
}

fn apply_add(
    state: &mut LedgerState,
    product_id: ProductId,
    qty: i64,
    at: DateTime<Utc>,
    purchase_ref: Option<PurchaseId>,
    policy: CostingPolicy,
) -> LedgerResult<StockLot> {
    state.product(product_id)?;
    let seq = state.alloc_seq();
    let lot = add_to_lots(
        state.lots_mut(product_id),
        product_id,
        qty,
        at,
        purchase_ref,
        policy,
        seq,
    )?;
    let stock = state.sync_stock_cache(product_id)?;
    tracing::debug!(product = %product_id, qty, stock, at = %at, "booked stock in");
    Ok(lot)
}

fn apply_reduce(
    state: &mut LedgerState,
    product_id: ProductId,
    qty: i64,
    at: DateTime<Utc>,
    policy: CostingPolicy,
) -> LedgerResult<DrainOutcome> {
    state.product(product_id)?;
    let outcome = drain_lots(state.lots_mut(product_id), qty, policy)?;
    let stock = state.sync_stock_cache(product_id)?;
    if outcome.clamped() {
        tracing::warn!(
            product = %product_id,
            requested = qty,
            undrained = outcome.undrained,
            at = %at,
            "stock reduction clamped at zero; the books held fewer units than requested"
        );
    } else {
        tracing::debug!(product = %product_id, qty, stock, at = %at, "booked stock out");
    }
    Ok(outcome)
}
