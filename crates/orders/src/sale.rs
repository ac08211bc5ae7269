use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_parties::PartyId;
use controltower_products::ProductId;

/// Sale order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleOrderId(pub RecordId);

impl SaleOrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sale line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleLineId(pub RecordId);

impl SaleLineId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Procurement group identifier (shared between a sale order and the
/// outbound delivery it spawned).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcurementGroupId(pub RecordId);

impl ProcurementGroupId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

/// Capability interface: collaborator documents that carry a procurement
/// group expose it here, checked at compile time instead of probing
/// attributes at runtime.
pub trait HasProcurementGroup {
    fn procurement_group(&self) -> Option<ProcurementGroupId>;
}

/// Sale order header (external contract, consumed by id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    id: SaleOrderId,
    company_id: CompanyId,
    /// Document reference, e.g. "S00042".
    reference: String,
    partner_id: PartyId,
    procurement_group: Option<ProcurementGroupId>,
    created_at: DateTime<Utc>,
}

impl SaleOrder {
    pub fn new(
        id: SaleOrderId,
        company_id: CompanyId,
        reference: impl Into<String>,
        partner_id: PartyId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::validation("sale order reference cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            reference,
            partner_id,
            procurement_group: None,
            created_at,
        })
    }

    pub fn with_procurement_group(mut self, group: ProcurementGroupId) -> Self {
        self.procurement_group = Some(group);
        self
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn partner_id(&self) -> PartyId {
        self.partner_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl HasProcurementGroup for SaleOrder {
    fn procurement_group(&self) -> Option<ProcurementGroupId> {
        self.procurement_group
    }
}

impl Entity for SaleOrder {
    type Id = SaleOrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Sale line: customer-side demand for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    id: SaleLineId,
    order_id: SaleOrderId,
    product_id: ProductId,
    quantity: Qty,
    delivered_qty: Qty,
    /// "Send for procurement": line participates in consolidation and in
    /// automatic transit assignment. Unset means never auto-assign.
    send_for_procurement: bool,
}

impl SaleLine {
    pub fn new(
        id: SaleLineId,
        order_id: SaleOrderId,
        product_id: ProductId,
        quantity: Qty,
        send_for_procurement: bool,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("sale line quantity must be positive"));
        }
        Ok(Self {
            id,
            order_id,
            product_id,
            quantity,
            delivered_qty: Decimal::ZERO,
            send_for_procurement,
        })
    }

    pub fn order_id(&self) -> SaleOrderId {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    pub fn delivered_qty(&self) -> Qty {
        self.delivered_qty
    }

    pub fn send_for_procurement(&self) -> bool {
        self.send_for_procurement
    }

    /// Quantity sold but not yet delivered.
    pub fn outstanding(&self) -> Qty {
        let out = self.quantity - self.delivered_qty;
        if out < Decimal::ZERO { Decimal::ZERO } else { out }
    }

    pub fn record_delivered(&mut self, qty: Qty) {
        self.delivered_qty += qty;
    }
}

impl Entity for SaleLine {
    type Id = SaleLineId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_line(qty: Qty) -> SaleLine {
        SaleLine::new(
            SaleLineId::new(RecordId::new()),
            SaleOrderId::new(RecordId::new()),
            ProductId::new(RecordId::new()),
            qty,
            true,
        )
        .unwrap()
    }

    #[test]
    fn outstanding_never_goes_negative() {
        let mut line = test_line(dec!(100));
        line.record_delivered(dec!(40));
        assert_eq!(line.outstanding(), dec!(60));
        line.record_delivered(dec!(70));
        assert_eq!(line.outstanding(), dec!(0));
    }

    #[test]
    fn new_line_rejects_non_positive_quantity() {
        let err = SaleLine::new(
            SaleLineId::new(RecordId::new()),
            SaleOrderId::new(RecordId::new()),
            ProductId::new(RecordId::new()),
            dec!(0),
            true,
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }
}
