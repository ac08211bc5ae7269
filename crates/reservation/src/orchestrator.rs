use chrono::Duration;
use rust_decimal::Decimal;

use controltower_allocation::AllocationLedger;
use controltower_core::{DomainError, DomainResult, Entity, ExecutionContext, RecordId};
use controltower_orders::{OrderBook, PurchaseOrderId, SaleOrderId};
use controltower_parties::PartyId;
use controltower_products::Catalog;
use controltower_stock::{ReceiptId, StockIndex};
use controltower_voyage::{TransitLine, TransitLineId, Voyage, VoyageId, VoyageStatus};

use crate::matching::{plan_receipt_load, LoadUnit};
use crate::order::{ReservationBook, ReservationLine, ReservationOrder, ReservationOrderId};
use crate::propagate::{propagate_receipt, PropagationOutcome};

/// Default ocean-leg estimate applied when a voyage is registered from a
/// receipt with no booked ETA.
pub const DEFAULT_TRANSIT_DAYS: i64 = 21;

/// Outcome of populating a voyage from a physical receipt.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReceiptLoadOutcome {
    pub lines_created: usize,
    pub bound: usize,
    pub holds_created: usize,
    /// Units that bound visually but could not be resolved to a physical
    /// stock unit (no hold placed).
    pub unresolved_quants: usize,
}

/// Outcome of a batch reassignment.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub bound: usize,
    pub released: usize,
    pub holds_swapped: usize,
    /// Placeholder or unresolved lines where only the visual binding moved.
    pub visual_only: usize,
    pub reservation_order: Option<ReservationOrderId>,
}

/// Request-scoped facade over the shared indexes.
///
/// Every operation here touches at least two of them and must leave the
/// pair consistent; single-index rules stay on the owning types.
pub struct Orchestrator<'a> {
    pub ctx: &'a ExecutionContext,
    pub book: &'a mut OrderBook,
    pub catalog: &'a Catalog,
    pub ledger: &'a mut AllocationLedger,
    pub stock: &'a mut StockIndex,
    pub reservations: &'a mut ReservationBook,
}

impl<'a> Orchestrator<'a> {
    /// Pre-arrival population: one placeholder line per open allocation on
    /// the commitment, already bound to its customer order.
    pub fn populate_from_commitment(
        &mut self,
        voyage: &mut Voyage,
        purchase_id: PurchaseOrderId,
    ) -> DomainResult<usize> {
        struct Pending {
            product: controltower_products::ProductId,
            quantity: controltower_core::Qty,
            allocation: controltower_allocation::AllocationId,
            partner: PartyId,
            order: SaleOrderId,
        }

        let mut pending = Vec::new();
        let line_ids: Vec<_> = self
            .book
            .purchase_lines_of(purchase_id)
            .map(|l| l.id())
            .collect();
        if line_ids.is_empty() {
            return Err(DomainError::not_found());
        }
        for line_id in line_ids {
            let product = self
                .book
                .purchase_line(line_id)
                .map(|l| l.product_id())
                .ok_or_else(DomainError::not_found)?;
            for record in self.ledger.records_for_purchase_line(line_id) {
                if !record.is_open() || record.remaining() <= Decimal::ZERO {
                    continue;
                }
                let Some(sale_line) = self.book.sale_line(record.sale_line_id()) else {
                    continue;
                };
                let Some(partner) = self.book.partner_of_sale_line(record.sale_line_id())
                else {
                    continue;
                };
                pending.push(Pending {
                    product,
                    quantity: record.remaining(),
                    allocation: record.id(),
                    partner,
                    order: sale_line.order_id(),
                });
            }
        }

        let created = pending.len();
        for item in pending {
            let mut line = TransitLine::placeholder(
                TransitLineId::new(RecordId::new()),
                item.product,
                item.quantity,
            )?;
            line.bind(item.partner, item.order);
            line.set_allocation_ref(item.allocation);
            voyage.push_line(line);
        }
        Ok(created)
    }

    /// Arrival population: plan the demand-matching walk over the receipt's
    /// units, then apply the plan — lines, quant resolution, holds, and
    /// allocation consumption — in one pass.
    pub fn populate_from_receipt(
        &mut self,
        voyage: &mut Voyage,
        receipt_id: ReceiptId,
    ) -> DomainResult<ReceiptLoadOutcome> {
        let receipt = self
            .stock
            .receipt(receipt_id)
            .ok_or_else(DomainError::not_found)?;
        let destination = receipt.destination();
        let mut units = Vec::new();
        for line in receipt.lines() {
            let Some(lot_id) = line.lot_id else {
                tracing::warn!(
                    receipt = %receipt.reference(),
                    product = %line.product_id,
                    "receipt line without lot skipped during voyage population"
                );
                continue;
            };
            let container = self
                .stock
                .lot(lot_id)
                .and_then(|lot| lot.container_ref())
                .map(str::to_owned);
            units.push(LoadUnit {
                lot_id,
                product_id: line.product_id,
                quantity: line.quantity,
                container,
            });
        }

        // Phase one: pure planning. Nothing below runs if this is where a
        // failure would occur.
        let plan = plan_receipt_load(self.book, self.ledger, &units);

        // Phase two: apply.
        voyage.clear_placeholders();
        let mut outcome = ReceiptLoadOutcome::default();
        for planned in &plan.lines {
            let mut line = TransitLine::physical(
                TransitLineId::new(RecordId::new()),
                planned.product_id,
                planned.lot_id,
                planned.quantity,
            )?;
            if let Some(container) = &planned.container {
                line.set_container(container.clone());
            }

            let quant = self
                .stock
                .find_quant_at(planned.lot_id, planned.product_id, destination)
                .or_else(|| {
                    self.stock
                        .find_quant_recovery(planned.lot_id, planned.product_id)
                });
            if let Some(quant_id) = quant {
                line.set_quant(quant_id);
            }

            if let Some(binding) = planned.binding {
                line.bind(binding.partner_id, binding.order_id);
                line.set_allocation_ref(binding.allocation_id);
                outcome.bound += 1;
                match quant {
                    Some(quant_id) => {
                        self.stock.cancel_active_hold(quant_id);
                        let order_ref = self
                            .book
                            .sale_order(binding.order_id)
                            .map(|o| o.reference().to_owned())
                            .unwrap_or_default();
                        self.stock.place_hold(
                            self.ctx.company_id,
                            quant_id,
                            binding.partner_id,
                            self.ctx.actor_id,
                            self.ctx.now,
                            format!("Transit assignment - {order_ref}"),
                        )?;
                        outcome.holds_created += 1;
                    }
                    None => {
                        tracing::warn!(
                            lot = %planned.lot_id,
                            product = %planned.product_id,
                            "no stock unit found for received lot; binding kept visual only"
                        );
                        outcome.unresolved_quants += 1;
                    }
                }
            }

            line.lock();
            voyage.push_line(line);
            outcome.lines_created += 1;
        }

        for (allocation_id, qty) in &plan.consumption {
            if let Some(record) = self.ledger.record_mut(*allocation_id) {
                record.mark_loaded(*qty)?;
            }
        }
        voyage.set_receipt(receipt_id);
        Ok(outcome)
    }

    /// Reassign a batch of transit lines to one customer order, or release
    /// them (`target = None`).
    ///
    /// All lines of the batch share one fresh reservation header; if every
    /// unit turned out placeholder or unresolvable the header is discarded
    /// rather than confirmed empty.
    pub fn reassign_lines(
        &mut self,
        voyage: &mut Voyage,
        line_ids: &[TransitLineId],
        target: Option<(PartyId, SaleOrderId)>,
        reason: &str,
    ) -> DomainResult<ReassignOutcome> {
        let mut outcome = ReassignOutcome::default();
        match target {
            None => {
                for id in line_ids {
                    let line = voyage.line(*id).ok_or_else(DomainError::not_found)?;
                    if let Some(quant_id) = line.quant_id() {
                        self.stock.cancel_active_hold(quant_id);
                    }
                    let line = voyage.line_mut(*id).ok_or_else(DomainError::not_found)?;
                    line.release();
                    outcome.released += 1;
                }
                Ok(outcome)
            }
            Some((partner_id, order_id)) => {
                if self.book.sale_order(order_id).is_none() {
                    return Err(DomainError::validation(
                        "cannot bind a unit to an unknown order",
                    ));
                }
                let order_ref = self
                    .book
                    .sale_order(order_id)
                    .map(|o| o.reference().to_owned())
                    .unwrap_or_default();
                let header_id = self.reservations.insert(ReservationOrder::new(
                    ReservationOrderId::new(RecordId::new()),
                    self.ctx.company_id,
                    partner_id,
                    self.ctx.now,
                ));
                let destination = voyage
                    .receipt_id()
                    .and_then(|rid| self.stock.receipt(rid))
                    .map(|r| r.destination());

                for id in line_ids {
                    let line = voyage.line(*id).ok_or_else(DomainError::not_found)?;
                    // An allocation back-reference survives the rebind only
                    // when it already points at the target order; otherwise
                    // arrival would keep crediting the previous customer.
                    let retained = line.allocation_ref().filter(|alloc| {
                        self.ledger
                            .record(*alloc)
                            .and_then(|r| self.book.sale_line(r.sale_line_id()))
                            .is_some_and(|sl| sl.order_id() == order_id)
                    });
                    let Some(lot_id) = line.lot_id() else {
                        // Placeholder: visual binding only.
                        let line =
                            voyage.line_mut(*id).ok_or_else(DomainError::not_found)?;
                        line.bind(partner_id, order_id);
                        if let Some(alloc) = retained {
                            line.set_allocation_ref(alloc);
                        }
                        outcome.visual_only += 1;
                        continue;
                    };
                    let product_id = line.product_id();
                    let quantity = line.quantity();

                    let quant = line.quant_id().or_else(|| {
                        destination
                            .and_then(|loc| self.stock.find_quant_at(lot_id, product_id, loc))
                            .or_else(|| self.stock.find_quant_recovery(lot_id, product_id))
                    });

                    let line = voyage.line_mut(*id).ok_or_else(DomainError::not_found)?;
                    line.bind(partner_id, order_id);
                    if let Some(alloc) = retained {
                        line.set_allocation_ref(alloc);
                    }
                    let Some(quant_id) = quant else {
                        tracing::warn!(
                            lot = %lot_id,
                            product = %product_id,
                            "no stock unit found during reassignment; binding kept visual only"
                        );
                        outcome.visual_only += 1;
                        continue;
                    };
                    line.set_quant(quant_id);

                    let keep_hold = self
                        .stock
                        .active_hold_for(quant_id)
                        .map(|hold| hold.partner_id() == partner_id);
                    match keep_hold {
                        Some(true) => {}
                        Some(false) => {
                            self.stock.cancel_active_hold(quant_id);
                            self.stock.place_hold(
                                self.ctx.company_id,
                                quant_id,
                                partner_id,
                                self.ctx.actor_id,
                                self.ctx.now,
                                format!("{reason} - {order_ref}"),
                            )?;
                            outcome.holds_swapped += 1;
                        }
                        None => {
                            self.stock.place_hold(
                                self.ctx.company_id,
                                quant_id,
                                partner_id,
                                self.ctx.actor_id,
                                self.ctx.now,
                                format!("{reason} - {order_ref}"),
                            )?;
                        }
                    }

                    let price_unit = self
                        .catalog
                        .get(product_id)
                        .map(|p| p.pricing().reservation_price())
                        .unwrap_or(0);
                    if let Some(header) = self.reservations.get_mut(header_id) {
                        header.push_line(ReservationLine {
                            transit_line_id: *id,
                            product_id,
                            lot_id,
                            quantity,
                            price_unit,
                        })?;
                    }
                    outcome.bound += 1;
                }

                let empty = self
                    .reservations
                    .get(header_id)
                    .is_none_or(|h| h.is_empty());
                if empty {
                    self.reservations.discard(header_id);
                } else if let Some(header) = self.reservations.get_mut(header_id) {
                    header.confirm()?;
                    outcome.reservation_order = Some(header_id);
                }
                Ok(outcome)
            }
        }
    }

    /// Confirm departure: the voyage goes to sea and every allocation its
    /// lines reference leaves `pending`.
    pub fn confirm_transit(&mut self, voyage: &mut Voyage) -> DomainResult<()> {
        voyage.confirm_transit()?;
        let refs: Vec<_> = voyage
            .lines()
            .iter()
            .filter_map(|l| l.allocation_ref())
            .collect();
        self.ledger.mark_in_transit(&refs);
        Ok(())
    }

    /// Close the voyage as delivered.
    ///
    /// Guarded: a voyage whose warehouse receipt is still open cannot close.
    /// On success every line's allocation is credited with the line's full
    /// quantity; the clamp absorbs overlap with load-time consumption.
    pub fn arrive(&mut self, voyage: &mut Voyage) -> DomainResult<()> {
        if let Some(receipt_id) = voyage.receipt_id() {
            if let Some(receipt) = self.stock.receipt(receipt_id) {
                if !receipt.is_done() {
                    return Err(DomainError::invariant(format!(
                        "voyage {} cannot close: receipt {} is still open",
                        voyage.reference(),
                        receipt.reference()
                    )));
                }
            }
        }
        voyage.arrive(self.ctx.today())?;
        let consumed: Vec<_> = voyage
            .lines()
            .iter()
            .filter_map(|l| l.allocation_ref().map(|a| (a, l.quantity())))
            .collect();
        for (allocation_id, qty) in consumed {
            if let Some(record) = self.ledger.record_mut(allocation_id) {
                record.mark_received(qty)?;
            }
        }
        Ok(())
    }

    /// Cancel the voyage. Consumption already posted to allocations stays:
    /// the reconciled position is sunk.
    pub fn cancel(&mut self, voyage: &mut Voyage) -> DomainResult<()> {
        voyage.cancel()
    }

    /// Register a voyage in the requested stage for a freshly confirmed
    /// commitment. Returns `None` when the commitment carries no open
    /// allocations.
    ///
    /// The BL reference falls back from the vendor reference to the order
    /// reference; lines start as placeholders bound to their customers.
    pub fn register_commitment_voyage(
        &mut self,
        purchase_id: PurchaseOrderId,
        reference: impl Into<String>,
    ) -> DomainResult<Option<Voyage>> {
        let order = self
            .book
            .purchase_order(purchase_id)
            .ok_or_else(DomainError::not_found)?;
        let bl_ref = order
            .vendor_reference()
            .unwrap_or_else(|| order.reference())
            .to_owned();

        let has_open = self.book.purchase_lines_of(purchase_id).any(|l| {
            self.ledger
                .records_for_purchase_line(l.id())
                .any(|r| r.is_open() && r.remaining() > Decimal::ZERO)
        });
        if !has_open {
            return Ok(None);
        }

        let mut voyage = Voyage::new(
            VoyageId::new(RecordId::new()),
            self.ctx.company_id,
            reference,
            self.ctx.today(),
        )?
        .with_status(VoyageStatus::Requested)
        .with_purchase(purchase_id)
        .with_bl_ref(bl_ref);
        self.populate_from_commitment(&mut voyage, purchase_id)?;
        tracing::info!(
            voyage = %voyage.reference(),
            purchase = %purchase_id,
            "registered requested voyage from confirmed commitment"
        );
        Ok(Some(voyage))
    }

    /// Register a voyage for a receipt that completed into a transit
    /// holding location. Returns `None` when the destination is not a
    /// transit area.
    ///
    /// The voyage starts at sea with a default ETA; the BL reference falls
    /// back from the receipt's manual field to the purchase vendor
    /// reference to the origin document.
    pub fn register_receipt_voyage(
        &mut self,
        receipt_id: ReceiptId,
        reference: impl Into<String>,
    ) -> DomainResult<Option<Voyage>> {
        let receipt = self
            .stock
            .receipt(receipt_id)
            .ok_or_else(DomainError::not_found)?;
        let is_transit = self
            .stock
            .location(receipt.destination())
            .is_some_and(|loc| loc.is_transit());
        if !is_transit {
            return Ok(None);
        }

        let bl_ref = receipt
            .bl_ref()
            .map(str::to_owned)
            .or_else(|| {
                receipt.purchase_id().and_then(|po| {
                    self.book
                        .purchase_order(po)
                        .and_then(|o| o.vendor_reference())
                        .map(str::to_owned)
                })
            })
            .or_else(|| receipt.origin().map(str::to_owned));
        let container_ref = receipt.container_ref().map(str::to_owned);
        let purchase_id = receipt.purchase_id();

        let mut voyage = Voyage::new(
            VoyageId::new(RecordId::new()),
            self.ctx.company_id,
            reference,
            self.ctx.today(),
        )?
        .with_status(VoyageStatus::OnSea)
        .with_eta(self.ctx.today() + Duration::days(DEFAULT_TRANSIT_DAYS));
        if let Some(bl) = bl_ref {
            voyage = voyage.with_bl_ref(bl);
        }
        if let Some(purchase_id) = purchase_id {
            voyage = voyage.with_purchase(purchase_id);
        }

        self.populate_from_receipt(&mut voyage, receipt_id)?;
        if voyage.container_ref().is_none() {
            if let Some(container) = container_ref {
                voyage.set_container_ref(container);
            }
        }
        tracing::info!(
            voyage = %voyage.reference(),
            receipt = %receipt_id,
            "registered voyage from transit receipt"
        );
        Ok(Some(voyage))
    }

    /// Push confirmed bindings into the customers' outbound deliveries.
    pub fn propagate_receipt(&mut self, voyage: &Voyage) -> DomainResult<PropagationOutcome> {
        propagate_receipt(self.book, self.stock, voyage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use controltower_allocation::{AllocationState, ConsolidationTarget};
    use controltower_core::{CompanyId, Qty, UserId};
    use controltower_orders::{SaleLine, SaleLineId, SaleOrder};
    use controltower_products::{Pricing, Product, ProductId};
    use controltower_stock::{
        Location, LocationId, LocationUsage, Lot, LotId, Quant, QuantId, Receipt, ReceiptLine,
    };
    use controltower_voyage::AllocationStatus;
    use rust_decimal_macros::dec;

    struct World {
        ctx: ExecutionContext,
        book: OrderBook,
        catalog: Catalog,
        ledger: AllocationLedger,
        stock: StockIndex,
        reservations: ReservationBook,
        product: ProductId,
        vendor: PartyId,
        transit_loc: LocationId,
    }

    impl World {
        fn new() -> Self {
            controltower_observability::init();
            let company = CompanyId::new();
            let mut catalog = Catalog::new();
            let product = catalog.insert(
                Product::new(
                    ProductId::new(RecordId::new()),
                    company,
                    "GRN-2CM",
                    "Granite slab 2cm",
                    Pricing {
                        standard_cost: 1_500,
                        list_price: 2_400,
                        preferred_price: Some(2_100),
                    },
                )
                .unwrap(),
            );
            let mut stock = StockIndex::new();
            let transit_loc = stock.insert_location(
                Location::new(
                    LocationId::new(RecordId::new()),
                    "WH/Tránsito Marítimo",
                    LocationUsage::Transit,
                )
                .unwrap(),
            );
            World {
                ctx: ExecutionContext::new(company, UserId::new(), Utc::now()),
                book: OrderBook::new(),
                catalog,
                ledger: AllocationLedger::new(),
                stock,
                reservations: ReservationBook::new(),
                product,
                vendor: PartyId::new(RecordId::new()),
                transit_loc,
            }
        }

        fn orchestrator(&mut self) -> Orchestrator<'_> {
            Orchestrator {
                ctx: &self.ctx,
                book: &mut self.book,
                catalog: &self.catalog,
                ledger: &mut self.ledger,
                stock: &mut self.stock,
                reservations: &mut self.reservations,
            }
        }

        fn sale(&mut self, reference: &str, qty: Qty, auto: bool) -> (PartyId, SaleOrderId, SaleLineId) {
            let partner = PartyId::new(RecordId::new());
            let order_id = self.book.insert_sale_order(
                SaleOrder::new(
                    controltower_orders::SaleOrderId::new(RecordId::new()),
                    self.ctx.company_id,
                    reference,
                    partner,
                    self.ctx.now,
                )
                .unwrap(),
            );
            let line_id = self
                .book
                .insert_sale_line(
                    SaleLine::new(
                        SaleLineId::new(RecordId::new()),
                        order_id,
                        self.product,
                        qty,
                        auto,
                    )
                    .unwrap(),
                )
                .unwrap();
            (partner, order_id, line_id)
        }

        fn consolidate(&mut self, lines: &[SaleLineId], reference: &str) -> PurchaseOrderId {
            let ctx = self.ctx;
            self.ledger
                .consolidate(
                    &ctx,
                    &mut self.book,
                    &self.catalog,
                    lines,
                    self.vendor,
                    ConsolidationTarget::New {
                        reference: reference.into(),
                    },
                )
                .unwrap()
        }

        /// Receipt at the transit location with one lot-tracked unit per
        /// quantity, quants already recorded.
        fn receipt_with_units(&mut self, quantities: &[Qty]) -> (ReceiptId, Vec<LotId>) {
            let mut receipt = Receipt::new(
                ReceiptId::new(RecordId::new()),
                self.ctx.company_id,
                "WH/IN/00042",
                self.transit_loc,
            )
            .unwrap();
            let mut lots = Vec::new();
            for (i, qty) in quantities.iter().enumerate() {
                let lot = self.stock.insert_lot(
                    Lot::new(LotId::new(RecordId::new()), format!("PL-{i:04}"))
                        .unwrap()
                        .with_container_ref("MSKU1234567"),
                );
                self.stock.insert_quant(Quant::new(
                    QuantId::new(RecordId::new()),
                    lot,
                    self.product,
                    self.transit_loc,
                    *qty,
                    self.ctx.now,
                ));
                receipt
                    .push_line(ReceiptLine {
                        product_id: self.product,
                        lot_id: Some(lot),
                        quantity: *qty,
                    })
                    .unwrap();
                lots.push(lot);
            }
            receipt.confirm().unwrap();
            (self.stock.insert_receipt(receipt), lots)
        }

        fn voyage(&self) -> Voyage {
            Voyage::new(
                VoyageId::new(RecordId::new()),
                self.ctx.company_id,
                "VOY-0001",
                self.ctx.today(),
            )
            .unwrap()
            .with_status(VoyageStatus::OnSea)
        }
    }

    #[test]
    fn receipt_population_matches_demands_in_creation_order() {
        let mut world = World::new();
        let (_, order_x, line_x) = world.sale("S00010", dec!(120), true);
        let (_, order_y, line_y) = world.sale("S00011", dec!(80), true);
        world.consolidate(&[line_x, line_y], "P00017");
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60); 4]);

        let mut voyage = world.voyage();
        let outcome = world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();

        assert_eq!(outcome.lines_created, 4);
        assert_eq!(outcome.bound, 4);
        assert_eq!(outcome.holds_created, 4);
        assert_eq!(outcome.unresolved_quants, 0);

        let orders: Vec<_> = voyage.lines().iter().map(|l| l.order_id().unwrap()).collect();
        assert_eq!(orders, vec![order_x, order_x, order_y, order_y]);
        assert!(voyage.lines().iter().all(|l| l.is_locked()));

        // X consumed exactly; Y's overshoot is clamped to its commitment.
        let record_x = world.ledger.records_for_sale_line(line_x).next().unwrap();
        assert_eq!(record_x.qty_received(), dec!(120));
        assert_eq!(record_x.state(), AllocationState::InTransit);
        let record_y = world.ledger.records_for_sale_line(line_y).next().unwrap();
        assert_eq!(record_y.qty_received(), dec!(80));

        let totals = voyage.totals();
        assert_eq!(totals.total_qty, dec!(240));
        assert_eq!(totals.percent_allocated, 100);
        assert_eq!(voyage.container_ref(), Some("MSKU1234567"));
    }

    #[test]
    fn tolerance_up_leaves_the_surplus_unit_free() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(200), true);
        world.consolidate(&[line], "P00017");
        let (receipt_id, _) =
            world.receipt_with_units(&[dec!(50), dec!(50), dec!(50), dec!(58), dec!(50)]);

        let mut voyage = world.voyage();
        let outcome = world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();

        assert_eq!(outcome.bound, 4);
        assert_eq!(
            voyage.lines()[4].allocation_status(),
            AllocationStatus::Available
        );
        assert_eq!(voyage.lines()[4].partner_id(), None);
        // 208 loaded, clamped to the 200 commitment.
        let record = world.ledger.records_for_sale_line(line).next().unwrap();
        assert_eq!(record.qty_received(), dec!(200));
    }

    #[test]
    fn arrive_is_guarded_by_the_open_receipt() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(120), true);
        world.consolidate(&[line], "P00017");
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60), dec!(60)]);

        let mut voyage = world.voyage();
        world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();

        let err = world.orchestrator().arrive(&mut voyage).unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected the open-receipt guard to reject arrival"),
        }
        assert_eq!(voyage.status(), VoyageStatus::OnSea);

        world
            .stock
            .receipt_mut(receipt_id)
            .unwrap()
            .mark_done()
            .unwrap();
        world.orchestrator().arrive(&mut voyage).unwrap();
        assert_eq!(voyage.status(), VoyageStatus::Delivered);
        assert_eq!(voyage.arrival_date(), Some(world.ctx.today()));
        let record = world.ledger.records_for_sale_line(line).next().unwrap();
        assert_eq!(record.state(), AllocationState::Done);
    }

    #[test]
    fn reassigning_swaps_the_hold_to_the_new_customer() {
        let mut world = World::new();
        let (partner_x, _, line_x) = world.sale("S00010", dec!(60), true);
        world.consolidate(&[line_x], "P00017");
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60)]);

        let mut voyage = world.voyage();
        world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();
        let transit_line = Entity::id(&voyage.lines()[0]);
        let quant_id = voyage.lines()[0].quant_id().unwrap();
        assert_eq!(
            world.stock.active_hold_for(quant_id).unwrap().partner_id(),
            partner_x
        );

        let (partner_y, order_y, _) = world.sale("S00011", dec!(60), true);
        let outcome = world
            .orchestrator()
            .reassign_lines(
                &mut voyage,
                &[transit_line],
                Some((partner_y, order_y)),
                "Commercial swap",
            )
            .unwrap();

        assert_eq!(outcome.bound, 1);
        assert_eq!(outcome.holds_swapped, 1);
        let hold = world.stock.active_hold_for(quant_id).unwrap();
        assert_eq!(hold.partner_id(), partner_y);
        assert!(hold.note().contains("S00011"));
        assert_eq!(
            world.stock.holds().filter(|h| h.is_active()).count(),
            1
        );

        let header = world
            .reservations
            .get(outcome.reservation_order.unwrap())
            .unwrap();
        assert_eq!(header.state(), crate::ReservationState::Confirmed);
        assert_eq!(header.lines().len(), 1);
        // Agreed price wins over list price.
        assert_eq!(header.lines()[0].price_unit, 2_100);
        assert_eq!(voyage.lines()[0].order_id(), Some(order_y));
    }

    #[test]
    fn releasing_cancels_the_hold_and_frees_the_unit() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(60), true);
        world.consolidate(&[line], "P00017");
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60)]);

        let mut voyage = world.voyage();
        world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();
        let transit_line = Entity::id(&voyage.lines()[0]);
        let quant_id = voyage.lines()[0].quant_id().unwrap();

        let outcome = world
            .orchestrator()
            .reassign_lines(&mut voyage, &[transit_line], None, "Released")
            .unwrap();

        assert_eq!(outcome.released, 1);
        assert!(world.stock.active_hold_for(quant_id).is_none());
        assert_eq!(
            voyage.lines()[0].allocation_status(),
            AllocationStatus::Available
        );
    }

    #[test]
    fn placeholder_reassignment_is_visual_only() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(120), true);
        let po_id = world.consolidate(&[line], "P00017");

        let mut voyage = world.voyage();
        let created = world
            .orchestrator()
            .populate_from_commitment(&mut voyage, po_id)
            .unwrap();
        assert_eq!(created, 1);
        assert!(voyage.lines()[0].is_placeholder());
        assert_eq!(
            voyage.lines()[0].allocation_status(),
            AllocationStatus::Reserved
        );

        let transit_line = Entity::id(&voyage.lines()[0]);
        let (partner_y, order_y, _) = world.sale("S00011", dec!(120), true);
        let outcome = world
            .orchestrator()
            .reassign_lines(
                &mut voyage,
                &[transit_line],
                Some((partner_y, order_y)),
                "Pre-arrival swap",
            )
            .unwrap();

        assert_eq!(outcome.visual_only, 1);
        assert_eq!(outcome.bound, 0);
        // No physical side effects, and the empty header was discarded.
        assert_eq!(world.stock.holds().count(), 0);
        assert_eq!(outcome.reservation_order, None);
        assert_eq!(world.reservations.orders().count(), 0);
        assert_eq!(voyage.lines()[0].partner_id(), Some(partner_y));
        assert_eq!(voyage.lines()[0].order_id(), Some(order_y));
    }

    #[test]
    fn confirm_transit_moves_pending_allocations() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(120), true);
        let po_id = world.consolidate(&[line], "P00017");

        let mut voyage = world.voyage().with_status(VoyageStatus::Requested);
        world
            .orchestrator()
            .populate_from_commitment(&mut voyage, po_id)
            .unwrap();
        world.orchestrator().confirm_transit(&mut voyage).unwrap();

        assert_eq!(voyage.status(), VoyageStatus::OnSea);
        let record = world.ledger.records_for_sale_line(line).next().unwrap();
        assert_eq!(record.state(), AllocationState::InTransit);
    }

    #[test]
    fn transit_receipt_registers_an_on_sea_voyage() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(120), true);
        let po_id = world.consolidate(&[line], "P00017");
        world
            .book
            .purchase_order_mut(po_id)
            .unwrap()
            .merge_origin(["S00010"]);
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60), dec!(60)]);

        let voyage = world
            .orchestrator()
            .register_receipt_voyage(receipt_id, "VOY-0002")
            .unwrap()
            .expect("transit destination must register a voyage");

        assert_eq!(voyage.status(), VoyageStatus::OnSea);
        assert_eq!(
            voyage.eta(),
            Some(world.ctx.today() + Duration::days(DEFAULT_TRANSIT_DAYS))
        );
        assert_eq!(voyage.lines().len(), 2);
        assert_eq!(voyage.receipt_id(), Some(receipt_id));
        // Both units matched the single open demand.
        assert!(voyage.lines().iter().all(|l| l.partner_id().is_some()));
    }

    #[test]
    fn confirmed_commitment_registers_a_requested_voyage() {
        let mut world = World::new();
        let (partner, order_x, line) = world.sale("S00010", dec!(120), true);
        let po_id = world.consolidate(&[line], "P00017");

        let voyage = world
            .orchestrator()
            .register_commitment_voyage(po_id, "VOY-0004")
            .unwrap()
            .expect("open allocations must register a voyage");

        assert_eq!(voyage.status(), VoyageStatus::Requested);
        assert_eq!(voyage.purchase_id(), Some(po_id));
        // No vendor reference yet: the BL falls back to the order name.
        assert_eq!(voyage.bl_ref(), Some("P00017"));
        assert_eq!(voyage.lines().len(), 1);
        assert!(voyage.lines()[0].is_placeholder());
        assert_eq!(voyage.lines()[0].quantity(), dec!(120));
        assert_eq!(voyage.lines()[0].partner_id(), Some(partner));
        assert_eq!(voyage.lines()[0].order_id(), Some(order_x));

        world
            .book
            .purchase_order_mut(po_id)
            .unwrap()
            .set_vendor_reference("BL-SHIP-778");
        let voyage = world
            .orchestrator()
            .register_commitment_voyage(po_id, "VOY-0005")
            .unwrap()
            .unwrap();
        assert_eq!(voyage.bl_ref(), Some("BL-SHIP-778"));
    }

    #[test]
    fn commitment_without_open_allocations_registers_nothing() {
        let mut world = World::new();
        let (_, _, line) = world.sale("S00010", dec!(120), true);
        let po_id = world.consolidate(&[line], "P00017");
        let record_id = world
            .ledger
            .records_for_sale_line(line)
            .next()
            .unwrap()
            .id();
        world.ledger.record_mut(record_id).unwrap().cancel().unwrap();

        let registered = world
            .orchestrator()
            .register_commitment_voyage(po_id, "VOY-0004")
            .unwrap();
        assert!(registered.is_none());
    }

    #[test]
    fn reassigned_units_stop_crediting_the_original_allocation() {
        let mut world = World::new();
        let (_, _, line_x) = world.sale("S00010", dec!(120), true);
        world.consolidate(&[line_x], "P00017");
        let (receipt_id, _) = world.receipt_with_units(&[dec!(60)]);

        let mut voyage = world.voyage();
        world
            .orchestrator()
            .populate_from_receipt(&mut voyage, receipt_id)
            .unwrap();
        let transit_line = Entity::id(&voyage.lines()[0]);

        let (partner_y, order_y, _) = world.sale("S00011", dec!(60), true);
        world
            .orchestrator()
            .reassign_lines(
                &mut voyage,
                &[transit_line],
                Some((partner_y, order_y)),
                "Commercial swap",
            )
            .unwrap();
        assert_eq!(voyage.lines()[0].allocation_ref(), None);

        // X's allocation keeps only what was loaded for X; arrival of the
        // reassigned unit credits no one.
        world
            .stock
            .receipt_mut(receipt_id)
            .unwrap()
            .mark_done()
            .unwrap();
        world.orchestrator().arrive(&mut voyage).unwrap();
        let record = world.ledger.records_for_sale_line(line_x).next().unwrap();
        assert_eq!(record.qty_received(), dec!(60));
        assert_ne!(record.state(), AllocationState::Done);
    }

    #[test]
    fn non_transit_receipt_registers_nothing() {
        let mut world = World::new();
        let internal = world.stock.insert_location(
            Location::new(
                LocationId::new(RecordId::new()),
                "WH/Stock",
                LocationUsage::Internal,
            )
            .unwrap(),
        );
        let receipt_id = world.stock.insert_receipt(
            Receipt::new(
                ReceiptId::new(RecordId::new()),
                world.ctx.company_id,
                "WH/IN/00099",
                internal,
            )
            .unwrap(),
        );

        let registered = world
            .orchestrator()
            .register_receipt_voyage(receipt_id, "VOY-0003")
            .unwrap();
        assert!(registered.is_none());
    }
}
