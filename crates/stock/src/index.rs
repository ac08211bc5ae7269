//! `StockIndex` — id-keyed index over the physical layer.
//!
//! Same arena layout as `OrderBook`: rows in insertion order plus hash
//! indexes. The hold-placement path is where the "at most one active hold
//! per quant" concurrency contract is enforced.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use controltower_core::{
    CompanyId, DomainError, DomainResult, Entity, Qty, RecordId, UserId,
};
use controltower_parties::PartyId;
use controltower_products::ProductId;

use crate::delivery::{Delivery, DeliveryId};
use crate::hold::{Hold, HoldId};
use crate::location::{Location, LocationId};
use crate::lot::{Lot, LotId};
use crate::quant::{Quant, QuantId};
use crate::receipt::{Receipt, ReceiptId};

#[derive(Debug, Default)]
pub struct StockIndex {
    locations: Vec<Location>,
    location_ix: HashMap<LocationId, usize>,
    lots: Vec<Lot>,
    lot_ix: HashMap<LotId, usize>,
    quants: Vec<Quant>,
    quant_ix: HashMap<QuantId, usize>,
    receipts: Vec<Receipt>,
    receipt_ix: HashMap<ReceiptId, usize>,
    deliveries: Vec<Delivery>,
    delivery_ix: HashMap<DeliveryId, usize>,
    holds: Vec<Hold>,
    hold_ix: HashMap<HoldId, usize>,
}

impl StockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_location(&mut self, location: Location) -> LocationId {
        let id = location.id();
        self.location_ix.insert(id, self.locations.len());
        self.locations.push(location);
        id
    }

    pub fn insert_lot(&mut self, lot: Lot) -> LotId {
        let id = lot.id();
        self.lot_ix.insert(id, self.lots.len());
        self.lots.push(lot);
        id
    }

    pub fn insert_quant(&mut self, quant: Quant) -> QuantId {
        let id = quant.id();
        self.quant_ix.insert(id, self.quants.len());
        self.quants.push(quant);
        id
    }

    pub fn insert_receipt(&mut self, receipt: Receipt) -> ReceiptId {
        let id = receipt.id();
        self.receipt_ix.insert(id, self.receipts.len());
        self.receipts.push(receipt);
        id
    }

    pub fn insert_delivery(&mut self, delivery: Delivery) -> DeliveryId {
        let id = delivery.id();
        self.delivery_ix.insert(id, self.deliveries.len());
        self.deliveries.push(delivery);
        id
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.location_ix.get(&id).map(|&i| &self.locations[i])
    }

    pub fn lot(&self, id: LotId) -> Option<&Lot> {
        self.lot_ix.get(&id).map(|&i| &self.lots[i])
    }

    pub fn quant(&self, id: QuantId) -> Option<&Quant> {
        self.quant_ix.get(&id).map(|&i| &self.quants[i])
    }

    pub fn receipt(&self, id: ReceiptId) -> Option<&Receipt> {
        self.receipt_ix.get(&id).map(|&i| &self.receipts[i])
    }

    pub fn receipt_mut(&mut self, id: ReceiptId) -> Option<&mut Receipt> {
        self.receipt_ix
            .get(&id)
            .copied()
            .map(move |i| &mut self.receipts[i])
    }

    pub fn delivery(&self, id: DeliveryId) -> Option<&Delivery> {
        self.delivery_ix.get(&id).map(|&i| &self.deliveries[i])
    }

    pub fn delivery_mut(&mut self, id: DeliveryId) -> Option<&mut Delivery> {
        self.delivery_ix
            .get(&id)
            .copied()
            .map(move |i| &mut self.deliveries[i])
    }

    pub fn hold(&self, id: HoldId) -> Option<&Hold> {
        self.hold_ix.get(&id).map(|&i| &self.holds[i])
    }

    pub fn holds(&self) -> impl Iterator<Item = &Hold> {
        self.holds.iter()
    }

    // --- quant queries ---------------------------------------------------

    /// Exact lookup: the unit at a known location with stock on hand.
    pub fn find_quant_at(
        &self,
        lot_id: LotId,
        product_id: ProductId,
        location_id: LocationId,
    ) -> Option<QuantId> {
        self.quants
            .iter()
            .find(|q| {
                q.lot_id() == lot_id
                    && q.product_id() == product_id
                    && q.location_id() == location_id
                    && q.has_stock()
            })
            .map(|q| q.id())
    }

    /// Recovery lookup: the unit anywhere in an internal or transit
    /// location, most recently recorded first.
    pub fn find_quant_recovery(&self, lot_id: LotId, product_id: ProductId) -> Option<QuantId> {
        let mut candidates: Vec<&Quant> = self
            .quants
            .iter()
            .filter(|q| {
                q.lot_id() == lot_id
                    && q.product_id() == product_id
                    && q.has_stock()
                    && self
                        .location(q.location_id())
                        .is_some_and(|loc| loc.is_internal() || loc.is_transit())
            })
            .collect();
        candidates.sort_by_key(|q| std::cmp::Reverse(q.recorded_at()));
        candidates.first().map(|q| q.id())
    }

    /// Physical quantity of a product in internal (non-transit) locations.
    pub fn available_qty(&self, product_id: ProductId) -> Qty {
        self.sum_where(product_id, |loc| loc.is_internal())
    }

    /// Physical quantity of a product in transit holding areas.
    pub fn transit_qty(&self, product_id: ProductId) -> Qty {
        self.sum_where(product_id, |loc| loc.is_transit())
    }

    fn sum_where(&self, product_id: ProductId, pred: impl Fn(&Location) -> bool) -> Qty {
        self.quants
            .iter()
            .filter(|q| q.product_id() == product_id)
            .filter(|q| self.location(q.location_id()).is_some_and(&pred))
            .map(|q| q.quantity())
            .fold(Decimal::ZERO, |acc, q| acc + q)
    }

    // --- holds -----------------------------------------------------------

    /// The active hold on a quant, if any.
    pub fn active_hold_for(&self, quant_id: QuantId) -> Option<&Hold> {
        self.holds
            .iter()
            .find(|h| h.quant_id() == quant_id && h.is_active())
    }

    /// Place a hold on a quant for a customer.
    ///
    /// Fails with `Conflict` while another active hold exists on the same
    /// unit — the caller must cancel it first. Under concurrent access this
    /// check rides on the store's row lock for the quant, so one of two
    /// racing actors observes the other's hold and retries.
    #[allow(clippy::too_many_arguments)]
    pub fn place_hold(
        &mut self,
        company_id: CompanyId,
        quant_id: QuantId,
        partner_id: PartyId,
        placed_by: UserId,
        now: DateTime<Utc>,
        note: impl Into<String>,
    ) -> DomainResult<HoldId> {
        let quant = self
            .quant(quant_id)
            .ok_or(DomainError::NotFound)?;
        let lot_id = quant.lot_id();
        if let Some(existing) = self.active_hold_for(quant_id) {
            return Err(DomainError::conflict(format!(
                "quant {} already held for partner {}",
                quant_id,
                existing.partner_id()
            )));
        }
        let hold = Hold::new(
            HoldId::new(RecordId::new()),
            company_id,
            lot_id,
            quant_id,
            partner_id,
            placed_by,
            now,
            note,
        );
        let id = hold.id();
        self.hold_ix.insert(id, self.holds.len());
        self.holds.push(hold);
        Ok(id)
    }

    /// Cancel the active hold on a quant; returns whether one existed.
    pub fn cancel_active_hold(&mut self, quant_id: QuantId) -> bool {
        if let Some(hold) = self
            .holds
            .iter_mut()
            .find(|h| h.quant_id() == quant_id && h.is_active())
        {
            hold.cancel();
            return true;
        }
        false
    }

    /// Pending deliveries of a partner, in insertion order.
    pub fn pending_deliveries_of(&self, partner_id: PartyId) -> impl Iterator<Item = &Delivery> {
        self.deliveries
            .iter()
            .filter(move |d| d.partner_id() == partner_id && d.is_pending())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationUsage;
    use rust_decimal_macros::dec;

    fn seed() -> (StockIndex, QuantId, PartyId) {
        let mut ix = StockIndex::new();
        let loc = ix.insert_location(
            Location::new(LocationId::new(RecordId::new()), "WH/Stock", LocationUsage::Internal)
                .unwrap(),
        );
        let lot = ix.insert_lot(Lot::new(LotId::new(RecordId::new()), "PL-0001").unwrap());
        let product = ProductId::new(RecordId::new());
        let quant = ix.insert_quant(Quant::new(
            QuantId::new(RecordId::new()),
            lot,
            product,
            loc,
            dec!(58),
            Utc::now(),
        ));
        (ix, quant, PartyId::new(RecordId::new()))
    }

    #[test]
    fn second_hold_on_same_quant_conflicts() {
        let (mut ix, quant, partner) = seed();
        let company = CompanyId::new();
        let user = UserId::new();

        ix.place_hold(company, quant, partner, user, Utc::now(), "first").unwrap();
        let err = ix
            .place_hold(company, quant, PartyId::new(RecordId::new()), user, Utc::now(), "second")
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict for second active hold"),
        }

        // After cancelling, the unit can be held again.
        assert!(ix.cancel_active_hold(quant));
        ix.place_hold(company, quant, partner, user, Utc::now(), "third").unwrap();
        assert!(ix.active_hold_for(quant).is_some());
    }

    #[test]
    fn recovery_prefers_most_recent_quant() {
        let mut ix = StockIndex::new();
        let internal = ix.insert_location(
            Location::new(LocationId::new(RecordId::new()), "WH/Stock", LocationUsage::Internal)
                .unwrap(),
        );
        let transit = ix.insert_location(
            Location::new(LocationId::new(RecordId::new()), "WH/Tránsito", LocationUsage::Transit)
                .unwrap(),
        );
        let lot = ix.insert_lot(Lot::new(LotId::new(RecordId::new()), "PL-0002").unwrap());
        let product = ProductId::new(RecordId::new());

        let older = Utc::now() - chrono::Duration::days(2);
        ix.insert_quant(Quant::new(
            QuantId::new(RecordId::new()),
            lot,
            product,
            internal,
            dec!(10),
            older,
        ));
        let newer = ix.insert_quant(Quant::new(
            QuantId::new(RecordId::new()),
            lot,
            product,
            transit,
            dec!(10),
            Utc::now(),
        ));

        assert_eq!(ix.find_quant_recovery(lot, product), Some(newer));
    }

    #[test]
    fn quantity_sums_split_internal_and_transit() {
        let mut ix = StockIndex::new();
        let internal = ix.insert_location(
            Location::new(LocationId::new(RecordId::new()), "WH/Stock", LocationUsage::Internal)
                .unwrap(),
        );
        let transit = ix.insert_location(
            Location::new(
                LocationId::new(RecordId::new()),
                "WH/Transito Maritimo",
                LocationUsage::Internal,
            )
            .unwrap(),
        );
        let product = ProductId::new(RecordId::new());
        for (loc, qty) in [(internal, dec!(40)), (transit, dec!(60)), (internal, dec!(2.5))] {
            let lot = ix.insert_lot(
                Lot::new(LotId::new(RecordId::new()), format!("PL-{qty}")).unwrap(),
            );
            ix.insert_quant(Quant::new(
                QuantId::new(RecordId::new()),
                lot,
                product,
                loc,
                qty,
                Utc::now(),
            ));
        }

        assert_eq!(ix.available_qty(product), dec!(42.5));
        assert_eq!(ix.transit_qty(product), dec!(60));
    }
}
