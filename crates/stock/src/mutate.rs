use chrono::{DateTime, Utc};

use stockbook_core::{LedgerError, LedgerResult, LotId, ProductId, PurchaseId};

use crate::lot::StockLot;
use crate::policy::{CostingPolicy, select_lot};

/// Result of a drain pass over a product's lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Quantity actually taken out of lots.
    pub drained: i64,
    /// Remainder that found no eligible lot.
    pub undrained: i64,
}

impl DrainOutcome {
    pub fn clamped(&self) -> bool {
        self.undrained > 0
    }
}

/// Book `qty` into a product's lots.
///
/// A purchase reference always creates a fresh lot: received batches keep
/// their own identity so FIFO/LIFO has layers to select over. A referenceless
/// addition consolidates into the policy-selected open lot (both its
/// `remaining_qty` and `original_qty` grow) only when that lot was recorded
/// at `at` itself; any other addition opens a fresh lot, so replays and stock
/// cards see every inflow at its own timestamp and recorded lots never change
/// after the fact.
///
/// `seq` is the insertion sequence for a newly created lot; it is unused when
/// the quantity merges into an existing one.
pub fn add_to_lots(
    lots: &mut Vec<StockLot>,
    product_id: ProductId,
    qty: i64,
    at: DateTime<Utc>,
    purchase_ref: Option<PurchaseId>,
    policy: CostingPolicy,
    seq: u64,
) -> LedgerResult<StockLot> {
    if qty <= 0 {
        return Err(LedgerError::InvalidQuantity(qty));
    }

    if purchase_ref.is_none() {
        if let Some(i) = select_lot(policy, lots).filter(|&i| lots[i].recorded_at == at) {
            let lot = &mut lots[i];
            lot.remaining_qty += qty;
            lot.original_qty += qty;
            return Ok(lot.clone());
        }
    }

    let lot = StockLot::stock_in(LotId::new(), product_id, at, qty, purchase_ref, seq)?;
    lots.push(lot.clone());
    Ok(lot)
}

/// Drain-and-spill: repeatedly take from the policy-selected lot until `qty`
/// is exhausted, spilling into the next eligible lot when one is depleted.
///
/// Stops early when no eligible lot remains; the caller decides what to do
/// with `undrained` (the ledger clamps the cached total at zero and warns).
/// Total remaining quantity decreases by exactly `drained`, and no lot goes
/// negative.
pub fn drain_lots(
    lots: &mut [StockLot],
    qty: i64,
    policy: CostingPolicy,
) -> LedgerResult<DrainOutcome> {
    if qty <= 0 {
        return Err(LedgerError::InvalidQuantity(qty));
    }

    let mut left = qty;
    while left > 0 {
        let Some(i) = select_lot(policy, lots) else {
            break;
        };
        let lot = &mut lots[i];
        let take = left.min(lot.remaining_qty);
        lot.remaining_qty -= take;
        left -= take;
    }

    Ok(DrainOutcome {
        drained: qty - left,
        undrained: left,
    })
}

/// Sum of lot remainders; what the product's cached `stock` must equal.
pub fn total_remaining(lots: &[StockLot]) -> i64 {
    lots.iter().map(|lot| lot.remaining_qty).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lot::LotKind;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn in_lot(product_id: ProductId, recorded_at: &str, qty: i64, seq: u64) -> StockLot {
        StockLot::stock_in(LotId::new(), product_id, at(recorded_at), qty, None, seq).unwrap()
    }

    #[test]
    fn fifo_drain_spills_into_the_next_lot() {
        let product_id = ProductId::new();
        let mut lots = vec![
            in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1),
            in_lot(product_id, "2024-03-02T00:00:00Z", 20, 2),
        ];

        let outcome = drain_lots(&mut lots, 15, CostingPolicy::Fifo).unwrap();

        assert_eq!(outcome, DrainOutcome { drained: 15, undrained: 0 });
        assert_eq!(lots[0].remaining_qty, 0);
        assert_eq!(lots[1].remaining_qty, 15);
    }

    #[test]
    fn lifo_drain_leaves_the_oldest_lot_untouched() {
        let product_id = ProductId::new();
        let mut lots = vec![
            in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1),
            in_lot(product_id, "2024-03-02T00:00:00Z", 20, 2),
        ];

        let outcome = drain_lots(&mut lots, 15, CostingPolicy::Lifo).unwrap();

        assert_eq!(outcome, DrainOutcome { drained: 15, undrained: 0 });
        assert_eq!(lots[0].remaining_qty, 10);
        assert_eq!(lots[1].remaining_qty, 5);
    }

    #[test]
    fn drain_reports_the_undrained_remainder() {
        let product_id = ProductId::new();
        let mut lots = vec![in_lot(product_id, "2024-03-01T00:00:00Z", 4, 1)];

        let outcome = drain_lots(&mut lots, 9, CostingPolicy::Fifo).unwrap();

        assert_eq!(outcome, DrainOutcome { drained: 4, undrained: 5 });
        assert!(outcome.clamped());
        assert_eq!(total_remaining(&lots), 0);
    }

    #[test]
    fn drain_rejects_non_positive_quantity() {
        let mut lots = Vec::new();
        let err = drain_lots(&mut lots, 0, CostingPolicy::Fifo).unwrap_err();
        match err {
            LedgerError::InvalidQuantity(0) => {}
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn add_merges_into_a_lot_from_the_same_instant() {
        let product_id = ProductId::new();
        let mut lots = vec![in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1)];

        let target = add_to_lots(
            &mut lots,
            product_id,
            5,
            at("2024-03-01T00:00:00Z"),
            None,
            CostingPolicy::Fifo,
            2,
        )
        .unwrap();

        assert_eq!(lots.len(), 1);
        assert_eq!(target.id, lots[0].id);
        assert_eq!(lots[0].remaining_qty, 15);
        assert_eq!(lots[0].original_qty, 15);
        lots[0].check_invariants().unwrap();
    }

    #[test]
    fn add_at_a_later_instant_opens_its_own_lot() {
        let product_id = ProductId::new();
        let mut lots = vec![
            in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1),
            in_lot(product_id, "2024-03-02T00:00:00Z", 20, 2),
        ];

        let lot = add_to_lots(
            &mut lots,
            product_id,
            5,
            at("2024-03-05T00:00:00Z"),
            None,
            CostingPolicy::Fifo,
            3,
        )
        .unwrap();

        assert_eq!(lots.len(), 3);
        assert_eq!(lot.recorded_at, at("2024-03-05T00:00:00Z"));
        assert_eq!(lot.remaining_qty, 5);
        assert_eq!(lot.original_qty, 5);
        assert_eq!(lots[0].original_qty, 10);
        assert_eq!(lots[1].original_qty, 20);
    }

    #[test]
    fn add_with_purchase_ref_always_creates_a_lot() {
        let product_id = ProductId::new();
        let purchase = PurchaseId::new();
        let mut lots = vec![in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1)];

        let lot = add_to_lots(
            &mut lots,
            product_id,
            40,
            at("2024-03-05T00:00:00Z"),
            Some(purchase),
            CostingPolicy::Fifo,
            2,
        )
        .unwrap();

        assert_eq!(lots.len(), 2);
        assert_eq!(lot.kind, LotKind::In);
        assert_eq!(lot.purchase_ref, Some(purchase));
        assert_eq!(lot.original_qty, 40);
        assert_eq!(lot.remaining_qty, 40);
        assert_eq!(lots[0].remaining_qty, 10);
    }

    #[test]
    fn add_creates_a_lot_when_nothing_is_open() {
        let product_id = ProductId::new();
        let mut lots = vec![in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1)];
        drain_lots(&mut lots, 10, CostingPolicy::Fifo).unwrap();

        let lot = add_to_lots(
            &mut lots,
            product_id,
            6,
            at("2024-03-06T00:00:00Z"),
            None,
            CostingPolicy::Fifo,
            2,
        )
        .unwrap();

        assert_eq!(lots.len(), 2);
        assert_eq!(lot.seq, 2);
        assert_eq!(total_remaining(&lots), 6);
    }

    #[test]
    fn reduce_then_add_restores_the_total() {
        let product_id = ProductId::new();
        let mut lots = vec![
            in_lot(product_id, "2024-03-01T00:00:00Z", 10, 1),
            in_lot(product_id, "2024-03-02T00:00:00Z", 20, 2),
        ];
        let before = total_remaining(&lots);

        drain_lots(&mut lots, 12, CostingPolicy::Fifo).unwrap();
        add_to_lots(
            &mut lots,
            product_id,
            12,
            at("2024-03-03T00:00:00Z"),
            None,
            CostingPolicy::Fifo,
            3,
        )
        .unwrap();

        assert_eq!(total_remaining(&lots), before);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_lots() -> impl Strategy<Value = Vec<StockLot>> {
            let product_id = ProductId::new();
            prop::collection::vec((1i64..200, 0u64..86_400), 0..8).prop_map(move |specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (qty, offset))| {
                        let recorded_at = at("2024-03-01T00:00:00Z")
                            + chrono::Duration::seconds(offset as i64);
                        StockLot::stock_in(
                            LotId::new(),
                            product_id,
                            recorded_at,
                            qty,
                            None,
                            i as u64,
                        )
                        .unwrap()
                    })
                    .collect()
            })
        }

        fn arb_policy() -> impl Strategy<Value = CostingPolicy> {
            prop_oneof![
                Just(CostingPolicy::Fifo),
                Just(CostingPolicy::Lifo),
                Just(CostingPolicy::Normal),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            #[test]
            fn drain_accounts_for_every_unit(
                mut lots in arb_lots(),
                qty in 1i64..500,
                policy in arb_policy(),
            ) {
                let before = total_remaining(&lots);
                let outcome = drain_lots(&mut lots, qty, policy).unwrap();

                prop_assert_eq!(outcome.drained + outcome.undrained, qty);
                prop_assert_eq!(outcome.drained, before.min(qty));
                prop_assert_eq!(total_remaining(&lots), before - outcome.drained);

                for lot in &lots {
                    prop_assert!(lot.check_invariants().is_ok());
                }
            }

            #[test]
            fn add_preserves_bounds_and_prior_lots(
                mut lots in arb_lots(),
                qty in 1i64..500,
                policy in arb_policy(),
            ) {
                let before = total_remaining(&lots);
                let originals: Vec<i64> = lots.iter().map(|lot| lot.original_qty).collect();
                let next_seq = lots.len() as u64;
                add_to_lots(
                    &mut lots,
                    ProductId::new(),
                    qty,
                    at("2024-03-09T00:00:00Z"),
                    None,
                    policy,
                    next_seq,
                )
                .unwrap();

                // No seeded lot shares the add's instant, so it must land in
                // its own lot and leave every recorded quantity alone.
                prop_assert_eq!(lots.len(), originals.len() + 1);
                prop_assert_eq!(total_remaining(&lots), before + qty);
                for (lot, original) in lots.iter().zip(&originals) {
                    prop_assert_eq!(lot.original_qty, *original);
                }
                for lot in &lots {
                    prop_assert!(lot.check_invariants().is_ok());
                }
            }
        }
    }
}
