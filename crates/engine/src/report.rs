//! Period valuation report.
//!
//! One row per registered product over a date range, plus column-wise footer
//! totals. All values are plain numbers; formatting and localization belong to
//! the presentation layer.

use serde::{Deserialize, Serialize};
use stockbook_core::{DateRange, ProductId};
use stockbook_products::Product;
use stockbook_stock::LotKind;

use crate::asof;
use crate::state::LedgerState;

/// One product's row. Quantities are units; amounts are in the smallest
/// currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReportRow {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    /// Unit cost.
    pub initial_price: i64,
    /// Unit selling price.
    pub selling_price: i64,
    /// Stock level strictly before the range opened.
    pub beginning_stock: i64,
    /// Units booked in inside the range.
    pub purchase_qty_in: i64,
    /// Units sold inside the range.
    pub sale_qty_out: i64,
    /// Net stock change across the range.
    pub mutation: i64,
    /// Stock level at the range end. Anchored on the last approved count
    /// inside the range when one exists.
    pub ending_stock: i64,
    pub sale_gross_amount: i64,
    /// Cost of goods sold, from stored line snapshots.
    pub sale_cost: i64,
    pub sale_discount: i64,
    /// Purchase spend inside the range at the product's unit cost.
    pub purchase_amount: i64,
    pub net_after_discount: i64,
    pub gross_profit: i64,
    pub net_profit: i64,
    pub ending_stock_value_at_cost: i64,
    pub ending_stock_value_at_selling_price: i64,
}

/// Column-wise sums over every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterTotals {
    pub beginning_stock: i64,
    pub purchase_qty_in: i64,
    pub sale_qty_out: i64,
    pub mutation: i64,
    pub ending_stock: i64,
    pub sale_gross_amount: i64,
    pub sale_cost: i64,
    pub sale_discount: i64,
    pub purchase_amount: i64,
    pub net_after_discount: i64,
    pub gross_profit: i64,
    pub net_profit: i64,
    pub ending_stock_value_at_cost: i64,
    pub ending_stock_value_at_selling_price: i64,
}

impl FooterTotals {
    fn absorb(&mut self, row: &ProductReportRow) {
        self.beginning_stock += row.beginning_stock;
        self.purchase_qty_in += row.purchase_qty_in;
        self.sale_qty_out += row.sale_qty_out;
        self.mutation += row.mutation;
        self.ending_stock += row.ending_stock;
        self.sale_gross_amount += row.sale_gross_amount;
        self.sale_cost += row.sale_cost;
        self.sale_discount += row.sale_discount;
        self.purchase_amount += row.purchase_amount;
        self.net_after_discount += row.net_after_discount;
        self.gross_profit += row.gross_profit;
        self.net_profit += row.net_profit;
        self.ending_stock_value_at_cost += row.ending_stock_value_at_cost;
        self.ending_stock_value_at_selling_price += row.ending_stock_value_at_selling_price;
    }
}

/// The full report: rows sorted by SKU, quiet products included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReport {
    pub range: DateRange,
    pub rows: Vec<ProductReportRow>,
    pub totals: FooterTotals,
}

pub(crate) fn build(state: &LedgerState, range: DateRange) -> ProductReport {
    let mut rows: Vec<ProductReportRow> = state
        .products()
        .map(|product| build_row(state, product, range))
        .collect();
    rows.sort_by(|a, b| a.sku.cmp(&b.sku));

    let mut totals = FooterTotals::default();
    for row in &rows {
        totals.absorb(row);
    }

    ProductReport {
        range,
        rows,
        totals,
    }
}

fn build_row(state: &LedgerState, product: &Product, range: DateRange) -> ProductReportRow {
    let beginning_stock = asof::stock_before(state, product.id, range.start());
    let ending_stock = asof::stock_through(state, product.id, range.end());

    let mut purchase_qty_in = 0;
    for lot in state.lots_for(product.id) {
        if lot.kind == LotKind::In && range.contains(lot.recorded_at) {
            purchase_qty_in += lot.original_qty;
        }
    }
    let purchase_amount = purchase_qty_in * product.initial_price;

    let mut sale_qty_out = 0;
    let mut sale_gross_amount = 0;
    let mut sale_cost = 0;
    let mut sale_discount = 0;
    for stored in state.sales() {
        if !range.contains(stored.sale.sold_at()) {
            continue;
        }
        for line in stored.sale.lines() {
            if line.product_id() != product.id {
                continue;
            }
            sale_qty_out += line.quantity();
            sale_gross_amount += line.total_price();
            sale_cost += line.total_cost();
            sale_discount += line.discount();
        }
    }
    // Lines recorded without a cost snapshot fall back to the current unit cost.
    if sale_cost == 0 && sale_qty_out > 0 {
        sale_cost = sale_qty_out * product.initial_price;
    }

    let net_after_discount = sale_gross_amount - sale_discount;
    let gross_profit = sale_gross_amount - sale_cost;
    let net_profit = gross_profit - sale_discount;

    ProductReportRow {
        product_id: product.id,
        sku: product.sku.clone(),
        name: product.name.clone(),
        initial_price: product.initial_price,
        selling_price: product.selling_price,
        beginning_stock,
        purchase_qty_in,
        sale_qty_out,
        mutation: ending_stock - beginning_stock,
        ending_stock,
        sale_gross_amount,
        sale_cost,
        sale_discount,
        purchase_amount,
        net_after_discount,
        gross_profit,
        net_profit,
        ending_stock_value_at_cost: ending_stock * product.initial_price,
        ending_stock_value_at_selling_price: ending_stock * product.selling_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use stockbook_core::{LotId, OpnameId, SaleId};
    use stockbook_opname::{AdjustmentReason, OpnameEvent, OpnameItem};
    use stockbook_sales::{Sale, SaleLine};
    use stockbook_stock::StockLot;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn range(first: u32, last: u32) -> DateRange {
        DateRange::new(day(first), day(last)).unwrap()
    }

    fn seed_product(state: &mut LedgerState, sku: &str, cost: i64, price: i64) -> ProductId {
        let product = Product::new(ProductId::new(), sku, format!("{sku} name"), cost, price).unwrap();
        let id = product.id;
        state.insert_product(product).unwrap();
        id
    }

    fn stock_in(state: &mut LedgerState, id: ProductId, qty: i64, when: DateTime<Utc>, seq: u64) {
        let lot = StockLot::stock_in(LotId::new(), id, when, qty, None, seq).unwrap();
        state.insert_lot(lot).unwrap();
    }

    fn sell(
        state: &mut LedgerState,
        id: ProductId,
        qty: i64,
        gross: i64,
        cost: i64,
        discount: i64,
        when: DateTime<Utc>,
    ) {
        let line = SaleLine::new(id, qty, gross, cost, discount).unwrap();
        let code = state.next_sale_code();
        let sale = Sale::new(SaleId::new(), code, when, vec![line]).unwrap();
        state.insert_sale(sale).unwrap();
    }

    fn approve_count(
        state: &mut LedgerState,
        id: ProductId,
        actual: i64,
        when: DateTime<Utc>,
        seq: u64,
    ) {
        let number = state.next_opname_number();
        let mut event = OpnameEvent::draft(OpnameId::new(), number, when, seq).unwrap();
        event
            .push_item(OpnameItem::new(id, 0, actual, AdjustmentReason::ManualInput, None).unwrap())
            .unwrap();
        event.mark_approved(when).unwrap();
        state.insert_opname(event).unwrap();
    }

    fn row<'a>(report: &'a ProductReport, sku: &str) -> &'a ProductReportRow {
        report
            .rows
            .iter()
            .find(|r| r.sku == sku)
            .unwrap_or_else(|| panic!("no row for {sku}"))
    }

    #[test]
    fn fifty_in_twenty_out_valuation() {
        let mut state = LedgerState::new();
        let id = seed_product(&mut state, "SKU-1", 1000, 1500);
        stock_in(&mut state, id, 50, day(2), 100);
        sell(&mut state, id, 20, 30_000, 20_000, 0, day(3));

        let report = build(&state, range(2, 4));
        let row = row(&report, "SKU-1");

        assert_eq!(row.beginning_stock, 0);
        assert_eq!(row.purchase_qty_in, 50);
        assert_eq!(row.sale_qty_out, 20);
        assert_eq!(row.ending_stock, 30);
        assert_eq!(row.mutation, 30);
        assert_eq!(row.sale_gross_amount, 30_000);
        assert_eq!(row.sale_cost, 20_000);
        assert_eq!(row.purchase_amount, 50_000);
        assert_eq!(row.net_after_discount, 30_000);
        assert_eq!(row.gross_profit, 10_000);
        assert_eq!(row.net_profit, 10_000);
        assert_eq!(row.ending_stock_value_at_cost, 30_000);
        assert_eq!(row.ending_stock_value_at_selling_price, 45_000);
    }

    #[test]
    fn an_in_range_count_anchors_the_ending_stock() {
        let mut state = LedgerState::new();
        let id = seed_product(&mut state, "SKU-1", 1000, 1500);
        stock_in(&mut state, id, 30, day(2), 100);
        approve_count(&mut state, id, 25, day(3), 200);
        stock_in(&mut state, id, 5, day(4), 300);

        let report = build(&state, range(1, 5));
        let row = row(&report, "SKU-1");

        assert_eq!(row.ending_stock, 30);
        assert_eq!(row.beginning_stock, 0);
        assert_eq!(row.mutation, 30);
    }

    #[test]
    fn ending_stock_matches_the_boundary_formula_without_a_count() {
        let mut state = LedgerState::new();
        let id = seed_product(&mut state, "SKU-1", 1000, 1500);
        stock_in(&mut state, id, 40, day(1), 100);
        sell(&mut state, id, 10, 15_000, 10_000, 0, day(3));
        stock_in(&mut state, id, 20, day(4), 200);

        let report = build(&state, range(2, 5));
        let row = row(&report, "SKU-1");

        assert_eq!(row.beginning_stock, 40);
        assert_eq!(row.purchase_qty_in, 20);
        assert_eq!(row.sale_qty_out, 10);
        assert_eq!(
            row.ending_stock,
            row.beginning_stock + row.purchase_qty_in - row.sale_qty_out
        );
    }

    #[test]
    fn missing_cost_snapshots_fall_back_to_unit_cost() {
        let mut state = LedgerState::new();
        let id = seed_product(&mut state, "SKU-1", 700, 1200);
        stock_in(&mut state, id, 10, day(1), 100);
        sell(&mut state, id, 4, 4_800, 0, 0, day(2));

        let report = build(&state, range(1, 3));
        let row = row(&report, "SKU-1");

        assert_eq!(row.sale_cost, 4 * 700);
        assert_eq!(row.gross_profit, 4_800 - 2_800);
    }

    #[test]
    fn quiet_products_report_all_zero_movement() {
        let mut state = LedgerState::new();
        seed_product(&mut state, "SKU-9", 500, 900);

        let report = build(&state, range(1, 5));
        let row = row(&report, "SKU-9");

        assert_eq!(row.beginning_stock, 0);
        assert_eq!(row.purchase_qty_in, 0);
        assert_eq!(row.sale_qty_out, 0);
        assert_eq!(row.ending_stock, 0);
        assert_eq!(row.sale_gross_amount, 0);
        assert_eq!(row.sale_cost, 0);
    }

    #[test]
    fn rows_sort_by_sku_and_the_footer_sums_columns() {
        let mut state = LedgerState::new();
        let b = seed_product(&mut state, "SKU-B", 1000, 1500);
        let a = seed_product(&mut state, "SKU-A", 200, 300);
        stock_in(&mut state, b, 50, day(2), 100);
        sell(&mut state, b, 20, 30_000, 20_000, 1_000, day(3));
        stock_in(&mut state, a, 8, day(2), 200);

        let report = build(&state, range(1, 5));

        let skus: Vec<&str> = report.rows.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["SKU-A", "SKU-B"]);

        assert_eq!(report.totals.purchase_qty_in, 58);
        assert_eq!(report.totals.ending_stock, 38);
        assert_eq!(report.totals.sale_gross_amount, 30_000);
        assert_eq!(report.totals.sale_discount, 1_000);
        assert_eq!(report.totals.net_after_discount, 29_000);
        assert_eq!(report.totals.net_profit, 9_000);
        assert_eq!(
            report.totals.ending_stock_value_at_cost,
            30 * 1000 + 8 * 200
        );
        assert_eq!(
            report.totals.purchase_amount,
            50 * 1000 + 8 * 200
        );
    }

    #[test]
    fn events_outside_the_range_only_move_the_boundaries() {
        let mut state = LedgerState::new();
        let id = seed_product(&mut state, "SKU-1", 1000, 1500);
        stock_in(&mut state, id, 40, day(1), 100);
        sell(&mut state, id, 5, 7_500, 5_000, 0, day(8));

        let report = build(&state, range(2, 6));
        let row = row(&report, "SKU-1");

        assert_eq!(row.beginning_stock, 40);
        assert_eq!(row.purchase_qty_in, 0);
        assert_eq!(row.sale_qty_out, 0);
        assert_eq!(row.sale_gross_amount, 0);
        assert_eq!(row.ending_stock, 40);
        assert_eq!(row.mutation, 0);
    }
}
