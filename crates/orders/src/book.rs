//! `OrderBook` — id-keyed index over sale and purchase documents.
//!
//! Rows are stored in insertion order (creation order matters to the
//! demand-matching walk) with a hash index for lookup by id. All
//! cross-document references resolve through this index; nothing holds a
//! live reference to another document.

use std::collections::HashMap;

use controltower_core::{DomainError, DomainResult};

use crate::purchase::{PurchaseLine, PurchaseLineId, PurchaseOrder, PurchaseOrderId};
use crate::sale::{SaleLine, SaleLineId, SaleOrder, SaleOrderId};

#[derive(Debug, Default)]
pub struct OrderBook {
    sale_orders: Vec<SaleOrder>,
    sale_order_ix: HashMap<SaleOrderId, usize>,
    sale_lines: Vec<SaleLine>,
    sale_line_ix: HashMap<SaleLineId, usize>,
    purchase_orders: Vec<PurchaseOrder>,
    purchase_order_ix: HashMap<PurchaseOrderId, usize>,
    purchase_lines: Vec<PurchaseLine>,
    purchase_line_ix: HashMap<PurchaseLineId, usize>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_sale_order(&mut self, order: SaleOrder) -> SaleOrderId {
        let id = controltower_core::Entity::id(&order);
        self.sale_order_ix.insert(id, self.sale_orders.len());
        self.sale_orders.push(order);
        id
    }

    pub fn insert_sale_line(&mut self, line: SaleLine) -> DomainResult<SaleLineId> {
        if !self.sale_order_ix.contains_key(&line.order_id()) {
            return Err(DomainError::not_found());
        }
        let id = controltower_core::Entity::id(&line);
        self.sale_line_ix.insert(id, self.sale_lines.len());
        self.sale_lines.push(line);
        Ok(id)
    }

    pub fn insert_purchase_order(&mut self, order: PurchaseOrder) -> PurchaseOrderId {
        let id = controltower_core::Entity::id(&order);
        self.purchase_order_ix.insert(id, self.purchase_orders.len());
        self.purchase_orders.push(order);
        id
    }

    pub fn insert_purchase_line(&mut self, line: PurchaseLine) -> DomainResult<PurchaseLineId> {
        if !self.purchase_order_ix.contains_key(&line.order_id()) {
            return Err(DomainError::not_found());
        }
        let id = controltower_core::Entity::id(&line);
        self.purchase_line_ix.insert(id, self.purchase_lines.len());
        self.purchase_lines.push(line);
        Ok(id)
    }

    pub fn sale_order(&self, id: SaleOrderId) -> Option<&SaleOrder> {
        self.sale_order_ix.get(&id).map(|&i| &self.sale_orders[i])
    }

    pub fn sale_line(&self, id: SaleLineId) -> Option<&SaleLine> {
        self.sale_line_ix.get(&id).map(|&i| &self.sale_lines[i])
    }

    pub fn sale_line_mut(&mut self, id: SaleLineId) -> Option<&mut SaleLine> {
        self.sale_line_ix
            .get(&id)
            .copied()
            .map(move |i| &mut self.sale_lines[i])
    }

    pub fn purchase_order(&self, id: PurchaseOrderId) -> Option<&PurchaseOrder> {
        self.purchase_order_ix
            .get(&id)
            .map(|&i| &self.purchase_orders[i])
    }

    pub fn purchase_order_mut(&mut self, id: PurchaseOrderId) -> Option<&mut PurchaseOrder> {
        self.purchase_order_ix
            .get(&id)
            .copied()
            .map(move |i| &mut self.purchase_orders[i])
    }

    pub fn purchase_line(&self, id: PurchaseLineId) -> Option<&PurchaseLine> {
        self.purchase_line_ix
            .get(&id)
            .map(|&i| &self.purchase_lines[i])
    }

    pub fn purchase_line_mut(&mut self, id: PurchaseLineId) -> Option<&mut PurchaseLine> {
        self.purchase_line_ix
            .get(&id)
            .copied()
            .map(move |i| &mut self.purchase_lines[i])
    }

    /// Sale lines in creation order.
    pub fn sale_lines(&self) -> impl Iterator<Item = &SaleLine> {
        self.sale_lines.iter()
    }

    /// Purchase lines in creation order.
    pub fn purchase_lines(&self) -> impl Iterator<Item = &PurchaseLine> {
        self.purchase_lines.iter()
    }

    /// Lines of one purchase order, in creation order.
    pub fn purchase_lines_of(
        &self,
        order_id: PurchaseOrderId,
    ) -> impl Iterator<Item = &PurchaseLine> {
        self.purchase_lines
            .iter()
            .filter(move |l| l.order_id() == order_id)
    }

    /// The customer behind a sale line, resolved through its order header.
    pub fn partner_of_sale_line(
        &self,
        id: SaleLineId,
    ) -> Option<controltower_parties::PartyId> {
        let line = self.sale_line(id)?;
        self.sale_order(line.order_id()).map(|o| o.partner_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use controltower_core::{CompanyId, RecordId};
    use controltower_parties::PartyId;
    use controltower_products::ProductId;
    use rust_decimal_macros::dec;

    fn seed_order(book: &mut OrderBook) -> (SaleOrderId, SaleLineId, PartyId) {
        let partner = PartyId::new(RecordId::new());
        let order = SaleOrder::new(
            SaleOrderId::new(RecordId::new()),
            CompanyId::new(),
            "S00001",
            partner,
            Utc::now(),
        )
        .unwrap();
        let order_id = book.insert_sale_order(order);
        let line = SaleLine::new(
            SaleLineId::new(RecordId::new()),
            order_id,
            ProductId::new(RecordId::new()),
            dec!(120),
            true,
        )
        .unwrap();
        let line_id = book.insert_sale_line(line).unwrap();
        (order_id, line_id, partner)
    }

    #[test]
    fn sale_line_resolves_partner_through_header() {
        let mut book = OrderBook::new();
        let (_, line_id, partner) = seed_order(&mut book);
        assert_eq!(book.partner_of_sale_line(line_id), Some(partner));
    }

    #[test]
    fn inserting_line_for_unknown_order_fails() {
        let mut book = OrderBook::new();
        let line = SaleLine::new(
            SaleLineId::new(RecordId::new()),
            SaleOrderId::new(RecordId::new()),
            ProductId::new(RecordId::new()),
            dec!(10),
            true,
        )
        .unwrap();
        assert_eq!(book.insert_sale_line(line).unwrap_err(), DomainError::NotFound);
    }
}
