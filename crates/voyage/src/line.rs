use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_allocation::AllocationId;
use controltower_core::{DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_orders::SaleOrderId;
use controltower_parties::PartyId;
use controltower_products::ProductId;
use controltower_stock::{LotId, QuantId};

/// Transit line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitLineId(pub RecordId);

impl TransitLineId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransitLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Available,
    Reserved,
}

/// One physical unit (or pre-arrival placeholder) moving inside a voyage.
///
/// A line bound to a customer always names the customer's order; the two
/// fields change together through `bind`/`release` and can never drift
/// apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitLine {
    id: TransitLineId,
    product_id: ProductId,
    /// Absent on placeholders created before the physical lot is known.
    lot_id: Option<LotId>,
    /// Resolved physical stock unit; recovered lazily when missing.
    quant_id: Option<QuantId>,
    quantity: Qty,
    /// Container tag read from the lot at population time.
    container: Option<String>,
    partner_id: Option<PartyId>,
    order_id: Option<SaleOrderId>,
    allocation_status: AllocationStatus,
    /// The allocation that produced this binding, when one did.
    allocation_ref: Option<AllocationId>,
    /// Set once the unit is physically received and validated; lot and
    /// quantity are immutable from then on.
    locked: bool,
}

impl TransitLine {
    /// Placeholder line: expected but unarrived inventory.
    pub fn placeholder(
        id: TransitLineId,
        product_id: ProductId,
        quantity: Qty,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "transit line quantity must be positive",
            ));
        }
        Ok(Self {
            id,
            product_id,
            lot_id: None,
            quant_id: None,
            quantity,
            container: None,
            partner_id: None,
            order_id: None,
            allocation_status: AllocationStatus::Available,
            allocation_ref: None,
            locked: false,
        })
    }

    /// Physical line built from a received unit.
    pub fn physical(
        id: TransitLineId,
        product_id: ProductId,
        lot_id: LotId,
        quantity: Qty,
    ) -> DomainResult<Self> {
        let mut line = Self::placeholder(id, product_id, quantity)?;
        line.lot_id = Some(lot_id);
        Ok(line)
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn lot_id(&self) -> Option<LotId> {
        self.lot_id
    }

    pub fn quant_id(&self) -> Option<QuantId> {
        self.quant_id
    }

    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn partner_id(&self) -> Option<PartyId> {
        self.partner_id
    }

    pub fn order_id(&self) -> Option<SaleOrderId> {
        self.order_id
    }

    pub fn allocation_status(&self) -> AllocationStatus {
        self.allocation_status
    }

    pub fn allocation_ref(&self) -> Option<AllocationId> {
        self.allocation_ref
    }

    pub fn is_placeholder(&self) -> bool {
        self.lot_id.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_container(&mut self, container: impl Into<String>) {
        self.container = Some(container.into());
    }

    pub fn set_allocation_ref(&mut self, allocation: AllocationId) {
        self.allocation_ref = Some(allocation);
    }

    /// Attach the resolved physical stock unit.
    pub fn set_quant(&mut self, quant_id: QuantId) {
        self.quant_id = Some(quant_id);
    }

    /// Bind this unit to a customer order. Both halves of the binding move
    /// together, and any allocation back-reference from a previous binding
    /// is dropped; callers re-point it when the new binding comes from an
    /// allocation.
    pub fn bind(&mut self, partner_id: PartyId, order_id: SaleOrderId) {
        self.partner_id = Some(partner_id);
        self.order_id = Some(order_id);
        self.allocation_status = AllocationStatus::Reserved;
        self.allocation_ref = None;
    }

    /// Drop the customer binding; the unit becomes free stock.
    pub fn release(&mut self) {
        self.partner_id = None;
        self.order_id = None;
        self.allocation_status = AllocationStatus::Available;
        self.allocation_ref = None;
    }

    /// Freeze lot and quantity after physical receipt.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Replace the quantity on an unlocked line (pre-receipt correction).
    pub fn set_quantity(&mut self, quantity: Qty) -> DomainResult<()> {
        if self.locked {
            return Err(DomainError::invariant(
                "received transit lines are immutable",
            ));
        }
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "transit line quantity must be positive",
            ));
        }
        self.quantity = quantity;
        Ok(())
    }
}

impl Entity for TransitLine {
    type Id = TransitLineId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_line() -> TransitLine {
        TransitLine::physical(
            TransitLineId::new(RecordId::new()),
            ProductId::new(RecordId::new()),
            LotId::new(RecordId::new()),
            dec!(60),
        )
        .unwrap()
    }

    #[test]
    fn bind_and_release_keep_customer_and_order_in_step() {
        let mut line = test_line();
        let partner = PartyId::new(RecordId::new());
        let order = SaleOrderId::new(RecordId::new());

        line.bind(partner, order);
        assert_eq!(line.partner_id(), Some(partner));
        assert_eq!(line.order_id(), Some(order));
        assert_eq!(line.allocation_status(), AllocationStatus::Reserved);

        line.release();
        assert_eq!(line.partner_id(), None);
        assert_eq!(line.order_id(), None);
        assert_eq!(line.allocation_status(), AllocationStatus::Available);
        assert_eq!(line.allocation_ref(), None);
    }

    #[test]
    fn rebinding_drops_the_previous_allocation_reference() {
        let mut line = test_line();
        line.bind(PartyId::new(RecordId::new()), SaleOrderId::new(RecordId::new()));
        line.set_allocation_ref(AllocationId::new(RecordId::new()));
        assert!(line.allocation_ref().is_some());

        line.bind(PartyId::new(RecordId::new()), SaleOrderId::new(RecordId::new()));
        assert_eq!(line.allocation_ref(), None);
    }

    #[test]
    fn locked_line_rejects_quantity_changes() {
        let mut line = test_line();
        line.lock();
        assert!(line.set_quantity(dec!(50)).is_err());
        assert_eq!(line.quantity(), dec!(60));
    }
}
