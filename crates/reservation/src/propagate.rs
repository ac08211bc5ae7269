//! Downstream propagation: push transit bindings into outbound deliveries.
//!
//! Runs after the voyage's warehouse receipt completes. Idempotent by
//! construction: a lot already reserved on a delivery line is updated in
//! place, never duplicated, so re-running after a reassignment converges
//! instead of piling up reservations.

use controltower_core::{DomainError, DomainResult, Entity};
use controltower_orders::{HasProcurementGroup, OrderBook};
use controltower_stock::{DeliveryId, StockIndex};
use controltower_voyage::Voyage;

/// Counters from one propagation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    pub injected: usize,
    pub updated: usize,
    /// Bound units with no reachable delivery or delivery line; they stay
    /// free-stock reservation candidates.
    pub skipped: usize,
}

/// Inject one lot-specific reservation per bound transit line into the
/// matching pending outbound delivery.
///
/// Delivery resolution: the customer's pending deliveries are searched by
/// shared procurement group first, then by the order reference appearing in
/// the delivery origin. Generic (any-unit) reservations on the touched line
/// are released before the lot reservation goes in.
pub fn propagate_receipt(
    book: &OrderBook,
    stock: &mut StockIndex,
    voyage: &Voyage,
) -> DomainResult<PropagationOutcome> {
    let receipt_id = voyage.receipt_id().ok_or_else(DomainError::not_found)?;
    let receipt_done = stock
        .receipt(receipt_id)
        .ok_or_else(DomainError::not_found)?
        .is_done();
    if !receipt_done {
        return Err(DomainError::invariant(
            "cannot propagate reservations before the receipt completes",
        ));
    }

    let mut outcome = PropagationOutcome::default();
    for line in voyage.lines() {
        let (Some(lot_id), Some(partner_id), Some(order_id)) =
            (line.lot_id(), line.partner_id(), line.order_id())
        else {
            continue;
        };
        let Some(order) = book.sale_order(order_id) else {
            outcome.skipped += 1;
            continue;
        };

        let delivery_id = find_delivery(stock, partner_id, order.procurement_group(), order.reference());
        let Some(delivery_id) = delivery_id else {
            tracing::warn!(
                lot = %lot_id,
                order = order.reference(),
                "no pending delivery found for bound unit; left as free-stock candidate"
            );
            outcome.skipped += 1;
            continue;
        };

        let delivery = stock
            .delivery_mut(delivery_id)
            .ok_or_else(DomainError::not_found)?;
        let Some(delivery_line) = delivery.line_for_product_mut(line.product_id()) else {
            tracing::warn!(
                lot = %lot_id,
                order = order.reference(),
                "pending delivery has no line for the bound product"
            );
            outcome.skipped += 1;
            continue;
        };
        delivery_line.release_generic_reservations();
        if delivery_line.upsert_lot_reservation(lot_id, line.quantity()) {
            outcome.injected += 1;
        } else {
            outcome.updated += 1;
        }
    }
    Ok(outcome)
}

fn find_delivery(
    stock: &StockIndex,
    partner_id: controltower_parties::PartyId,
    group: Option<controltower_orders::ProcurementGroupId>,
    order_ref: &str,
) -> Option<DeliveryId> {
    if let Some(group) = group {
        if let Some(delivery) = stock
            .pending_deliveries_of(partner_id)
            .find(|d| d.procurement_group() == Some(group))
        {
            return Some(delivery.id());
        }
    }
    stock
        .pending_deliveries_of(partner_id)
        .find(|d| d.origin().is_some_and(|origin| origin.contains(order_ref)))
        .map(|d| d.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use controltower_core::{CompanyId, RecordId};
    use controltower_orders::{ProcurementGroupId, SaleOrder, SaleOrderId};
    use controltower_parties::PartyId;
    use controltower_products::ProductId;
    use controltower_stock::{
        Delivery, DeliveryLine, Location, LocationId, LocationUsage, Lot, LotId, LotReservation,
        Receipt, ReceiptId,
    };
    use controltower_voyage::{TransitLine, TransitLineId, Voyage, VoyageId, VoyageStatus};
    use rust_decimal_macros::dec;

    struct World {
        book: OrderBook,
        stock: StockIndex,
        voyage: Voyage,
        lot: LotId,
        delivery: controltower_stock::DeliveryId,
    }

    fn world(use_group: bool) -> World {
        let company = CompanyId::new();
        let partner = PartyId::new(RecordId::new());
        let product = ProductId::new(RecordId::new());
        let group = ProcurementGroupId::new(RecordId::new());

        let mut book = OrderBook::new();
        let mut order = SaleOrder::new(
            SaleOrderId::new(RecordId::new()),
            company,
            "S00010",
            partner,
            Utc::now(),
        )
        .unwrap();
        if use_group {
            order = order.with_procurement_group(group);
        }
        let order_id = book.insert_sale_order(order);

        let mut stock = StockIndex::new();
        let transit = stock.insert_location(
            Location::new(
                LocationId::new(RecordId::new()),
                "WH/Tránsito",
                LocationUsage::Transit,
            )
            .unwrap(),
        );
        let lot = stock.insert_lot(Lot::new(LotId::new(RecordId::new()), "PL-0001").unwrap());
        let mut receipt = Receipt::new(
            ReceiptId::new(RecordId::new()),
            company,
            "WH/IN/00042",
            transit,
        )
        .unwrap();
        receipt
            .push_line(controltower_stock::ReceiptLine {
                product_id: product,
                lot_id: Some(lot),
                quantity: dec!(58),
            })
            .unwrap();
        receipt.confirm().unwrap();
        receipt.mark_done().unwrap();
        let receipt_id = stock.insert_receipt(receipt);

        let mut delivery = Delivery::new(
            controltower_stock::DeliveryId::new(RecordId::new()),
            company,
            "WH/OUT/00007",
            partner,
        )
        .unwrap();
        if use_group {
            delivery = delivery.with_procurement_group(group);
        } else {
            delivery = delivery.with_origin("S00010");
        }
        let mut line = DeliveryLine::new(product, dec!(58));
        line.reservations.push(LotReservation {
            lot_id: None,
            quantity: dec!(58),
            done: false,
        });
        delivery.push_line(line);
        let delivery_id = stock.insert_delivery(delivery);

        let mut voyage = Voyage::new(
            VoyageId::new(RecordId::new()),
            company,
            "VOY-0001",
            Utc::now().date_naive(),
        )
        .unwrap()
        .with_status(VoyageStatus::ReceptionPending)
        .with_receipt(receipt_id);
        let mut transit_line = TransitLine::physical(
            TransitLineId::new(RecordId::new()),
            product,
            lot,
            dec!(58),
        )
        .unwrap();
        transit_line.bind(partner, order_id);
        voyage.push_line(transit_line);

        World {
            book,
            stock,
            voyage,
            lot,
            delivery: delivery_id,
        }
    }

    #[test]
    fn propagation_replaces_the_generic_reservation() {
        let mut w = world(true);
        let outcome = propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        assert_eq!(outcome, PropagationOutcome { injected: 1, updated: 0, skipped: 0 });

        let line = &w.stock.delivery(w.delivery).unwrap().lines()[0];
        assert_eq!(line.reservations.len(), 1);
        assert_eq!(line.reservations[0].lot_id, Some(w.lot));
        assert_eq!(line.reservations[0].quantity, dec!(58));
        assert!(!line.reservations[0].done);
    }

    #[test]
    fn rerunning_updates_instead_of_duplicating() {
        let mut w = world(true);
        propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        let second = propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        assert_eq!(second, PropagationOutcome { injected: 0, updated: 1, skipped: 0 });
        let line = &w.stock.delivery(w.delivery).unwrap().lines()[0];
        assert_eq!(line.reservations.len(), 1);
    }

    #[test]
    fn origin_reference_is_the_fallback_lookup() {
        let mut w = world(false);
        let outcome = propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        assert_eq!(outcome.injected, 1);
    }

    #[test]
    fn unbound_units_are_not_propagated() {
        let mut w = world(true);
        for line_id in w
            .voyage
            .lines()
            .iter()
            .map(Entity::id)
            .collect::<Vec<_>>()
        {
            w.voyage.line_mut(line_id).unwrap().release();
        }
        let outcome = propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        assert_eq!(outcome, PropagationOutcome::default());
        let line = &w.stock.delivery(w.delivery).unwrap().lines()[0];
        // The generic reservation stays untouched.
        assert_eq!(line.reservations.len(), 1);
        assert_eq!(line.reservations[0].lot_id, None);
    }

    #[test]
    fn missing_delivery_is_skipped_not_fatal() {
        let mut w = world(true);
        // Rebind the unit to a customer with no pending delivery at all.
        let stranger = PartyId::new(RecordId::new());
        let order_id = w.book.insert_sale_order(
            SaleOrder::new(
                SaleOrderId::new(RecordId::new()),
                CompanyId::new(),
                "S00099",
                stranger,
                Utc::now(),
            )
            .unwrap(),
        );
        let ids: Vec<_> = w.voyage.lines().iter().map(Entity::id).collect();
        w.voyage.line_mut(ids[0]).unwrap().bind(stranger, order_id);

        let outcome = propagate_receipt(&w.book, &mut w.stock, &w.voyage).unwrap();
        assert_eq!(outcome, PropagationOutcome { injected: 0, updated: 0, skipped: 1 });
    }
}

