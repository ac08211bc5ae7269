use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_orders::{HasProcurementGroup, ProcurementGroupId};
use controltower_parties::PartyId;
use controltower_products::ProductId;

use crate::lot::LotId;

/// Delivery identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub RecordId);

impl DeliveryId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Outbound movement state, driven by the warehouse engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    Pending,
    Done,
    Cancelled,
}

/// A reservation injected into a delivery line.
///
/// `lot_id = None` is a generic (any-unit) reservation; propagation replaces
/// those with lot-specific ones. `done` stays false here — completing the
/// move belongs to the warehouse engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotReservation {
    pub lot_id: Option<LotId>,
    pub quantity: Qty,
    pub done: bool,
}

/// One product line of an outbound delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLine {
    pub product_id: ProductId,
    pub quantity: Qty,
    pub reservations: Vec<LotReservation>,
}

impl DeliveryLine {
    pub fn new(product_id: ProductId, quantity: Qty) -> Self {
        Self {
            product_id,
            quantity,
            reservations: Vec::new(),
        }
    }

    /// Drop generic (non-lot-specific) reservations; lot-bound ones stay.
    pub fn release_generic_reservations(&mut self) -> usize {
        let before = self.reservations.len();
        self.reservations.retain(|r| r.lot_id.is_some());
        before - self.reservations.len()
    }

    /// Insert or update the reservation for `lot_id` — one reservation per
    /// lot per line, updated in place on re-runs.
    pub fn upsert_lot_reservation(&mut self, lot_id: LotId, quantity: Qty) -> bool {
        if let Some(existing) = self
            .reservations
            .iter_mut()
            .find(|r| r.lot_id == Some(lot_id))
        {
            existing.quantity = quantity;
            return false;
        }
        self.reservations.push(LotReservation {
            lot_id: Some(lot_id),
            quantity,
            done: false,
        });
        true
    }
}

/// Outbound delivery movement (external contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    id: DeliveryId,
    company_id: CompanyId,
    reference: String,
    partner_id: PartyId,
    /// Source document reference, e.g. the sale order name.
    origin: Option<String>,
    procurement_group: Option<ProcurementGroupId>,
    state: DeliveryState,
    lines: Vec<DeliveryLine>,
}

impl Delivery {
    pub fn new(
        id: DeliveryId,
        company_id: CompanyId,
        reference: impl Into<String>,
        partner_id: PartyId,
    ) -> DomainResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::validation("delivery reference cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            reference,
            partner_id,
            origin: None,
            procurement_group: None,
            state: DeliveryState::Pending,
            lines: Vec::new(),
        })
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
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

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn state(&self) -> DeliveryState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == DeliveryState::Pending
    }

    pub fn lines(&self) -> &[DeliveryLine] {
        &self.lines
    }

    pub fn push_line(&mut self, line: DeliveryLine) {
        self.lines.push(line);
    }

    pub fn line_for_product_mut(&mut self, product_id: ProductId) -> Option<&mut DeliveryLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }
}

impl HasProcurementGroup for Delivery {
    fn procurement_group(&self) -> Option<ProcurementGroupId> {
        self.procurement_group
    }
}

impl Entity for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn upsert_updates_existing_lot_reservation() {
        let mut line = DeliveryLine::new(ProductId::new(RecordId::new()), dec!(100));
        let lot = LotId::new(RecordId::new());

        assert!(line.upsert_lot_reservation(lot, dec!(60)));
        assert!(!line.upsert_lot_reservation(lot, dec!(58)));
        assert_eq!(line.reservations.len(), 1);
        assert_eq!(line.reservations[0].quantity, dec!(58));
    }

    #[test]
    fn release_generic_keeps_lot_bound_reservations() {
        let mut line = DeliveryLine::new(ProductId::new(RecordId::new()), dec!(100));
        line.reservations.push(LotReservation {
            lot_id: None,
            quantity: dec!(100),
            done: false,
        });
        let lot = LotId::new(RecordId::new());
        line.upsert_lot_reservation(lot, dec!(40));

        assert_eq!(line.release_generic_reservations(), 1);
        assert_eq!(line.reservations.len(), 1);
        assert_eq!(line.reservations[0].lot_id, Some(lot));
    }
}
