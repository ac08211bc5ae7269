//! Pure demand-matching: plan which arriving unit goes to which open
//! allocation.
//!
//! Planning never mutates anything. The orchestrator applies the resulting
//! `LoadPlan` in one pass, which is what makes shipment population atomic:
//! a failure during planning leaves every counter untouched.

use std::collections::HashMap;

use controltower_allocation::{AllocationId, AllocationLedger};
use controltower_core::{wants_more, Entity, Qty};
use controltower_orders::{OrderBook, SaleOrderId};
use controltower_parties::PartyId;
use controltower_products::ProductId;
use controltower_stock::LotId;

/// One received physical unit, in arrival order.
#[derive(Debug, Clone)]
pub struct LoadUnit {
    pub lot_id: LotId,
    pub product_id: ProductId,
    pub quantity: Qty,
    pub container: Option<String>,
}

/// The customer binding a planned line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedBinding {
    pub allocation_id: AllocationId,
    pub partner_id: PartyId,
    pub order_id: SaleOrderId,
}

/// One unit with its planned binding (`None` = free stock).
#[derive(Debug, Clone)]
pub struct PlannedLine {
    pub lot_id: LotId,
    pub product_id: ProductId,
    pub quantity: Qty,
    pub container: Option<String>,
    pub binding: Option<PlannedBinding>,
}

/// Outcome of one planning pass over a receipt.
#[derive(Debug, Default)]
pub struct LoadPlan {
    pub lines: Vec<PlannedLine>,
    /// Total quantity each allocation consumes in this load.
    pub consumption: HashMap<AllocationId, Qty>,
}

/// Walk the received units in order and assign each to the first open
/// allocation for its product that still wants material.
///
/// The tolerance-up rule: a record takes the *whole* next unit while its
/// assigned total sits below the ordered quantity (minus the rounding
/// epsilon), even when that overshoots. Customers get complete physical
/// units, never splits; the following unit falls through to the next record
/// or to free stock. Records whose demand line opted out of automatic
/// assignment are skipped.
pub fn plan_receipt_load(
    book: &OrderBook,
    ledger: &AllocationLedger,
    units: &[LoadUnit],
) -> LoadPlan {
    struct OpenRecord {
        allocation_id: AllocationId,
        ordered: Qty,
        assigned: Qty,
        binding: Option<(PartyId, SaleOrderId)>,
    }

    let mut queues: HashMap<ProductId, Vec<OpenRecord>> = HashMap::new();
    let mut plan = LoadPlan::default();

    for unit in units {
        let queue = queues.entry(unit.product_id).or_insert_with(|| {
            ledger
                .open_records_for_product(book, unit.product_id)
                .into_iter()
                .filter_map(|id| ledger.record(id))
                .filter(|record| {
                    book.sale_line(record.sale_line_id())
                        .is_some_and(|line| line.send_for_procurement())
                })
                .map(|record| OpenRecord {
                    allocation_id: record.id(),
                    ordered: record.quantity(),
                    assigned: record.qty_received(),
                    binding: book.sale_line(record.sale_line_id()).and_then(|line| {
                        book.sale_order(line.order_id())
                            .map(|order| (order.partner_id(), line.order_id()))
                    }),
                })
                .collect()
        });

        let slot = queue
            .iter_mut()
            .find(|record| wants_more(record.assigned, record.ordered));
        let binding = match slot {
            Some(record) => {
                record.assigned += unit.quantity;
                *plan
                    .consumption
                    .entry(record.allocation_id)
                    .or_insert(Qty::ZERO) += unit.quantity;
                record
                    .binding
                    .map(|(partner_id, order_id)| PlannedBinding {
                        allocation_id: record.allocation_id,
                        partner_id,
                        order_id,
                    })
            }
            None => None,
        };
        plan.lines.push(PlannedLine {
            lot_id: unit.lot_id,
            product_id: unit.product_id,
            quantity: unit.quantity,
            container: unit.container.clone(),
            binding,
        });
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use controltower_core::{CompanyId, RecordId};
    use controltower_orders::{
        PurchaseLine, PurchaseLineId, PurchaseOrder, PurchaseOrderId, SaleLine, SaleLineId,
        SaleOrder,
    };
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    struct Fixture {
        book: OrderBook,
        ledger: AllocationLedger,
        product: ProductId,
        purchase_line: PurchaseLineId,
    }

    fn fixture() -> Fixture {
        let mut book = OrderBook::new();
        let company = CompanyId::new();
        let product = ProductId::new(RecordId::new());
        let po = book.insert_purchase_order(
            PurchaseOrder::new(
                PurchaseOrderId::new(RecordId::new()),
                company,
                "P00017",
                PartyId::new(RecordId::new()),
                Utc::now(),
            )
            .unwrap(),
        );
        let purchase_line = book
            .insert_purchase_line(
                PurchaseLine::new(
                    PurchaseLineId::new(RecordId::new()),
                    po,
                    product,
                    dec!(1000),
                    1_500,
                    "Granite slab 2cm",
                )
                .unwrap(),
            )
            .unwrap();
        Fixture {
            book,
            ledger: AllocationLedger::new(),
            product,
            purchase_line,
        }
    }

    fn seed_demand(fx: &mut Fixture, qty: Qty, auto: bool) -> (SaleLineId, AllocationId) {
        let order_id = fx.book.insert_sale_order(
            SaleOrder::new(
                SaleOrderId::new(RecordId::new()),
                CompanyId::new(),
                format!("S{qty}"),
                PartyId::new(RecordId::new()),
                Utc::now(),
            )
            .unwrap(),
        );
        let line_id = fx
            .book
            .insert_sale_line(
                SaleLine::new(
                    SaleLineId::new(RecordId::new()),
                    order_id,
                    fx.product,
                    qty,
                    auto,
                )
                .unwrap(),
            )
            .unwrap();
        let allocation = fx.ledger.commit(fx.purchase_line, line_id, qty).unwrap();
        (line_id, allocation)
    }

    fn units(fx: &Fixture, quantities: &[Qty]) -> Vec<LoadUnit> {
        quantities
            .iter()
            .map(|q| LoadUnit {
                lot_id: LotId::new(RecordId::new()),
                product_id: fx.product,
                quantity: *q,
                container: None,
            })
            .collect()
    }

    #[test]
    fn records_consume_in_creation_order() {
        let mut fx = fixture();
        let (_, first) = seed_demand(&mut fx, dec!(120), true);
        let (_, second) = seed_demand(&mut fx, dec!(80), true);

        let plan = plan_receipt_load(
            &fx.book,
            &fx.ledger,
            &units(&fx, &[dec!(60), dec!(60), dec!(60), dec!(60)]),
        );

        // First record takes units 1-2 (exactly 120), second takes 3-4
        // (overshoot to 120 against 80 ordered).
        let bindings: Vec<_> = plan
            .lines
            .iter()
            .map(|l| l.binding.unwrap().allocation_id)
            .collect();
        assert_eq!(bindings, vec![first, first, second, second]);
        assert_eq!(plan.consumption[&first], dec!(120));
        assert_eq!(plan.consumption[&second], dec!(120));
    }

    #[test]
    fn tolerance_up_takes_the_whole_overshooting_unit() {
        let mut fx = fixture();
        let (_, allocation) = seed_demand(&mut fx, dec!(200), true);

        let plan = plan_receipt_load(
            &fx.book,
            &fx.ledger,
            &units(&fx, &[dec!(50), dec!(50), dec!(50), dec!(58), dec!(50)]),
        );

        // 150 assigned before the fourth unit still wants more, so the 58
        // goes in whole (208). The fifth unit finds the demand satisfied
        // and stays free.
        for line in &plan.lines[..4] {
            assert_eq!(line.binding.unwrap().allocation_id, allocation);
        }
        assert!(plan.lines[4].binding.is_none());
        assert_eq!(plan.consumption[&allocation], dec!(208));
    }

    #[test]
    fn opted_out_demand_lines_are_skipped() {
        let mut fx = fixture();
        seed_demand(&mut fx, dec!(120), false);

        let plan = plan_receipt_load(&fx.book, &fx.ledger, &units(&fx, &[dec!(60)]));
        assert!(plan.lines[0].binding.is_none());
        assert!(plan.consumption.is_empty());
    }

    #[test]
    fn planning_is_deterministic() {
        let mut fx = fixture();
        seed_demand(&mut fx, dec!(120), true);
        seed_demand(&mut fx, dec!(80), true);
        let load = units(&fx, &[dec!(60), dec!(45), dec!(60), dec!(60)]);

        let first = plan_receipt_load(&fx.book, &fx.ledger, &load);
        let second = plan_receipt_load(&fx.book, &fx.ledger, &load);
        let bindings = |plan: &LoadPlan| -> Vec<Option<AllocationId>> {
            plan.lines
                .iter()
                .map(|l| l.binding.map(|b| b.allocation_id))
                .collect()
        };
        assert_eq!(bindings(&first), bindings(&second));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 1000, ..ProptestConfig::default() })]

        // Minimal-prefix-sum rule: with enough material, a single demand is
        // assigned exactly the first prefix of whole units reaching it.
        #[test]
        fn assigned_total_is_the_minimal_covering_prefix(
            demand in 1u32..500,
            quantities in proptest::collection::vec(1u32..100, 1..20),
        ) {
            let mut fx = fixture();
            let demand = Qty::from(demand);
            let (_, allocation) = seed_demand(&mut fx, demand, true);
            let load = units(&fx, &quantities.iter().map(|q| Qty::from(*q)).collect::<Vec<_>>());

            let plan = plan_receipt_load(&fx.book, &fx.ledger, &load);
            let assigned = plan
                .consumption
                .get(&allocation)
                .copied()
                .unwrap_or(Qty::ZERO);

            let mut prefix = Qty::ZERO;
            let mut expected = Qty::ZERO;
            for q in &quantities {
                if prefix >= demand {
                    break;
                }
                prefix += Qty::from(*q);
                expected = prefix;
            }
            prop_assert_eq!(assigned, expected);
        }
    }
}
