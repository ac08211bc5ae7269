use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{
    DomainError, DomainResult, Entity, ExecutionContext, Qty, RecordId,
};
use controltower_orders::{
    OrderBook, PurchaseLine, PurchaseLineId, PurchaseOrder, PurchaseOrderId, SaleLineId,
};
use controltower_parties::{Directory, PartyId};
use controltower_products::{Catalog, ProductId};

use crate::record::{AllocationId, AllocationRecord, AllocationState};

/// Where consolidation puts the demand: an existing editable purchase order
/// or a fresh one.
#[derive(Debug, Clone)]
pub enum ConsolidationTarget {
    Existing(PurchaseOrderId),
    New { reference: String },
}

/// Per-purchase-line rollup shown next to the vendor commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub total_allocated: Qty,
    /// First customers by name, capped at three with a "+N" tail.
    pub customers: String,
}

/// Owner of every allocation record, in creation order.
#[derive(Debug, Default)]
pub struct AllocationLedger {
    records: Vec<AllocationRecord>,
    ix: HashMap<AllocationId, usize>,
    by_purchase_line: HashMap<PurchaseLineId, Vec<AllocationId>>,
    by_sale_line: HashMap<SaleLineId, Vec<AllocationId>>,
    next_seq: u64,
}

impl AllocationLedger {
    const SUMMARY_NAMES: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Commit part of a purchase line to a sale line.
    pub fn commit(
        &mut self,
        purchase_line_id: PurchaseLineId,
        sale_line_id: SaleLineId,
        quantity: Qty,
    ) -> DomainResult<AllocationId> {
        self.next_seq += 1;
        let record = AllocationRecord::new(
            AllocationId::new(RecordId::new()),
            self.next_seq,
            purchase_line_id,
            sale_line_id,
            quantity,
        )?;
        let id = record.id();
        self.ix.insert(id, self.records.len());
        self.by_purchase_line
            .entry(purchase_line_id)
            .or_default()
            .push(id);
        self.by_sale_line.entry(sale_line_id).or_default().push(id);
        self.records.push(record);
        Ok(id)
    }

    pub fn record(&self, id: AllocationId) -> Option<&AllocationRecord> {
        self.ix.get(&id).map(|&i| &self.records[i])
    }

    pub fn record_mut(&mut self, id: AllocationId) -> Option<&mut AllocationRecord> {
        self.ix.get(&id).copied().map(move |i| &mut self.records[i])
    }

    /// All records in creation order.
    pub fn records(&self) -> impl Iterator<Item = &AllocationRecord> {
        self.records.iter()
    }

    pub fn records_for_purchase_line(
        &self,
        id: PurchaseLineId,
    ) -> impl Iterator<Item = &AllocationRecord> {
        self.by_purchase_line
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.record(*id))
    }

    pub fn records_for_sale_line(
        &self,
        id: SaleLineId,
    ) -> impl Iterator<Item = &AllocationRecord> {
        self.by_sale_line
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.record(*id))
    }

    /// Open records for one product across all purchase lines, in creation
    /// order. This is the queue the demand-matching walk consumes.
    pub fn open_records_for_product(
        &self,
        book: &OrderBook,
        product_id: ProductId,
    ) -> Vec<AllocationId> {
        self.records
            .iter()
            .filter(|r| r.is_open())
            .filter(|r| {
                book.purchase_line(r.purchase_line_id())
                    .is_some_and(|l| l.product_id() == product_id)
            })
            .map(|r| r.id())
            .collect()
    }

    /// Rollup of the commitments against one purchase line.
    pub fn summary_for_purchase_line(
        &self,
        book: &OrderBook,
        directory: &Directory,
        id: PurchaseLineId,
    ) -> AllocationSummary {
        let mut total = Decimal::ZERO;
        let mut partners: Vec<PartyId> = Vec::new();
        for record in self.records_for_purchase_line(id) {
            if record.state() == AllocationState::Cancelled {
                continue;
            }
            total += record.quantity();
            if let Some(partner) = book.partner_of_sale_line(record.sale_line_id()) {
                if !partners.contains(&partner) {
                    partners.push(partner);
                }
            }
        }
        let mut customers: String = partners
            .iter()
            .take(Self::SUMMARY_NAMES)
            .map(|p| directory.name_of(*p))
            .collect::<Vec<_>>()
            .join(", ");
        if partners.len() > Self::SUMMARY_NAMES {
            customers.push_str(&format!(" +{}", partners.len() - Self::SUMMARY_NAMES));
        }
        AllocationSummary {
            total_allocated: total,
            customers,
        }
    }

    /// Batch departure confirmation.
    pub fn mark_in_transit(&mut self, ids: &[AllocationId]) {
        for id in ids {
            if let Some(record) = self.record_mut(*id) {
                record.mark_in_transit();
            }
        }
    }

    /// Cancel records whose purchase order was cancelled out from under
    /// them. Returns how many were repaired.
    pub fn heal_cancelled_commitments(&mut self, book: &OrderBook) -> usize {
        let stale: Vec<AllocationId> = self
            .records
            .iter()
            .filter(|r| r.is_open())
            .filter(|r| {
                book.purchase_line(r.purchase_line_id())
                    .and_then(|l| book.purchase_order(l.order_id()))
                    .is_some_and(|po| !po.state().is_open())
            })
            .map(|r| r.id())
            .collect();
        for id in &stale {
            if let Some(record) = self.record_mut(*id) {
                if record.cancel().is_ok() {
                    tracing::info!(allocation = %id, "detached allocation from cancelled purchase order");
                }
            }
        }
        stale.len()
    }

    /// Turn eligible open demand into vendor commitment lines plus one
    /// allocation record per demand line.
    ///
    /// Lines flagged off for procurement or already covered are skipped;
    /// if nothing remains the command fails instead of creating an empty
    /// order. Same-product demand lands on one purchase line.
    pub fn consolidate(
        &mut self,
        ctx: &ExecutionContext,
        book: &mut OrderBook,
        catalog: &Catalog,
        demand_lines: &[SaleLineId],
        vendor_id: PartyId,
        target: ConsolidationTarget,
    ) -> DomainResult<PurchaseOrderId> {
        struct Eligible {
            sale_line_id: SaleLineId,
            product_id: ProductId,
            quantity: Qty,
            order_ref: String,
        }

        let mut eligible = Vec::new();
        for id in demand_lines {
            let line = book.sale_line(*id).ok_or_else(DomainError::not_found)?;
            if !line.send_for_procurement() || line.outstanding() <= Decimal::ZERO {
                continue;
            }
            let order = book
                .sale_order(line.order_id())
                .ok_or_else(DomainError::not_found)?;
            eligible.push(Eligible {
                sale_line_id: *id,
                product_id: line.product_id(),
                quantity: line.outstanding(),
                order_ref: order.reference().to_owned(),
            });
        }
        if eligible.is_empty() {
            return Err(DomainError::validation(
                "no demand lines eligible for consolidation",
            ));
        }

        let po_id = match target {
            ConsolidationTarget::Existing(id) => {
                let order = book.purchase_order(id).ok_or_else(DomainError::not_found)?;
                if !order.state().accepts_lines() {
                    return Err(DomainError::validation(
                        "purchase order no longer accepts lines",
                    ));
                }
                if order.vendor_id() != vendor_id {
                    return Err(DomainError::validation(
                        "purchase order belongs to a different vendor",
                    ));
                }
                id
            }
            ConsolidationTarget::New { reference } => {
                let order = PurchaseOrder::new(
                    PurchaseOrderId::new(RecordId::new()),
                    ctx.company_id,
                    reference,
                    vendor_id,
                    ctx.now,
                )?;
                book.insert_purchase_order(order)
            }
        };

        let mut line_count = 0usize;
        for demand in &eligible {
            let existing = book
                .purchase_lines_of(po_id)
                .find(|l| l.product_id() == demand.product_id)
                .map(|l| l.id());
            let purchase_line_id = match existing {
                Some(line_id) => {
                    let line = book
                        .purchase_line_mut(line_id)
                        .ok_or_else(DomainError::not_found)?;
                    line.increase_quantity(demand.quantity)?;
                    line_id
                }
                None => {
                    let product = catalog
                        .get(demand.product_id)
                        .ok_or_else(DomainError::not_found)?;
                    let line = PurchaseLine::new(
                        PurchaseLineId::new(RecordId::new()),
                        po_id,
                        demand.product_id,
                        demand.quantity,
                        product.pricing().standard_cost,
                        format!("[{}] {}", demand.order_ref, product.name()),
                    )?;
                    line_count += 1;
                    book.insert_purchase_line(line)?
                }
            };
            self.commit(purchase_line_id, demand.sale_line_id, demand.quantity)?;
        }

        let refs: Vec<&str> = eligible.iter().map(|d| d.order_ref.as_str()).collect();
        if let Some(order) = book.purchase_order_mut(po_id) {
            order.merge_origin(refs);
        }
        tracing::info!(
            purchase_order = %po_id,
            demand_lines = eligible.len(),
            new_lines = line_count,
            "consolidated demand into purchase order"
        );
        Ok(po_id)
    }
}
