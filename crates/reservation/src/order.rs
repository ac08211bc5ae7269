use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_parties::PartyId;
use controltower_products::ProductId;
use controltower_stock::LotId;
use controltower_voyage::TransitLineId;

/// Reservation order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationOrderId(pub RecordId);

impl ReservationOrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReservationOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Draft,
    Confirmed,
}

/// One reserved unit on a customer-facing reservation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub transit_line_id: TransitLineId,
    pub product_id: ProductId,
    pub lot_id: LotId,
    pub quantity: Qty,
    /// Agreed price when one exists, list price otherwise. Smallest
    /// currency unit.
    pub price_unit: u64,
}

/// Customer-facing commitment header. One header collects every line of a
/// reassignment batch so a ten-line batch does not mint ten headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationOrder {
    id: ReservationOrderId,
    company_id: CompanyId,
    partner_id: PartyId,
    created_at: DateTime<Utc>,
    state: ReservationState,
    lines: Vec<ReservationLine>,
}

impl ReservationOrder {
    pub fn new(
        id: ReservationOrderId,
        company_id: CompanyId,
        partner_id: PartyId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            company_id,
            partner_id,
            created_at,
            state: ReservationState::Draft,
            lines: Vec::new(),
        }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn partner_id(&self) -> PartyId {
        self.partner_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    pub fn lines(&self) -> &[ReservationLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push_line(&mut self, line: ReservationLine) -> DomainResult<()> {
        if self.state != ReservationState::Draft {
            return Err(DomainError::invariant(
                "confirmed reservation orders are immutable",
            ));
        }
        self.lines.push(line);
        Ok(())
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot confirm a reservation order without lines",
            ));
        }
        self.state = ReservationState::Confirmed;
        Ok(())
    }
}

impl Entity for ReservationOrder {
    type Id = ReservationOrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Id-keyed store of reservation orders.
#[derive(Debug, Default)]
pub struct ReservationBook {
    orders: Vec<ReservationOrder>,
    ix: HashMap<ReservationOrderId, usize>,
}

impl ReservationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order: ReservationOrder) -> ReservationOrderId {
        let id = order.id();
        self.ix.insert(id, self.orders.len());
        self.orders.push(order);
        id
    }

    pub fn get(&self, id: ReservationOrderId) -> Option<&ReservationOrder> {
        self.ix.get(&id).map(|&i| &self.orders[i])
    }

    pub fn get_mut(&mut self, id: ReservationOrderId) -> Option<&mut ReservationOrder> {
        self.ix.get(&id).copied().map(move |i| &mut self.orders[i])
    }

    /// Drop a header that ended up with no lines; reindexes the tail.
    pub fn discard(&mut self, id: ReservationOrderId) -> bool {
        let Some(pos) = self.ix.remove(&id) else {
            return false;
        };
        self.orders.remove(pos);
        for (i, order) in self.orders.iter().enumerate().skip(pos) {
            self.ix.insert(order.id(), i);
        }
        true
    }

    pub fn orders(&self) -> impl Iterator<Item = &ReservationOrder> {
        self.orders.iter()
    }
}
