use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{
    clamp_received, wants_more, DomainError, DomainResult, Entity, Qty, RecordId,
};
use controltower_orders::{PurchaseLineId, SaleLineId};

/// Allocation record identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationId(pub RecordId);

impl AllocationId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AllocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationState {
    Pending,
    InTransit,
    Partial,
    Done,
    Cancelled,
}

impl AllocationState {
    /// Open records still count toward demand coverage and can consume
    /// arriving material.
    pub fn is_open(self) -> bool {
        !matches!(self, AllocationState::Done | AllocationState::Cancelled)
    }
}

/// One committed link between a purchase line and a sale line.
///
/// `qty_received` accumulates across load-time and arrival-time postings and
/// is clamped to `quantity`, so the two phases reporting overlapping
/// material never push a record past its commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    id: AllocationId,
    /// Ledger-assigned creation sequence; the matching walk orders by it.
    seq: u64,
    purchase_line_id: PurchaseLineId,
    sale_line_id: SaleLineId,
    quantity: Qty,
    qty_received: Qty,
    state: AllocationState,
}

impl AllocationRecord {
    pub(crate) fn new(
        id: AllocationId,
        seq: u64,
        purchase_line_id: PurchaseLineId,
        sale_line_id: SaleLineId,
        quantity: Qty,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "allocation quantity must be positive",
            ));
        }
        Ok(Self {
            id,
            seq,
            purchase_line_id,
            sale_line_id,
            quantity,
            qty_received: Decimal::ZERO,
            state: AllocationState::Pending,
        })
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn purchase_line_id(&self) -> PurchaseLineId {
        self.purchase_line_id
    }

    pub fn sale_line_id(&self) -> SaleLineId {
        self.sale_line_id
    }

    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    pub fn qty_received(&self) -> Qty {
        self.qty_received
    }

    pub fn state(&self) -> AllocationState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Committed but not yet arrived.
    pub fn remaining(&self) -> Qty {
        self.quantity - self.qty_received
    }

    /// Post arrived material against this record, clamped to the
    /// commitment. Moves to `Done` once the commitment is covered,
    /// `Partial` otherwise.
    pub fn mark_received(&mut self, qty: Qty) -> DomainResult<()> {
        self.ensure_open()?;
        if qty < Decimal::ZERO {
            return Err(DomainError::validation("received quantity cannot be negative"));
        }
        self.qty_received = clamp_received(self.qty_received + qty, self.quantity);
        self.state = if wants_more(self.qty_received, self.quantity) {
            AllocationState::Partial
        } else {
            AllocationState::Done
        };
        Ok(())
    }

    /// Post material assigned at vessel-load time. Consumption is the same
    /// clamped counter as `mark_received`, but the record stays open in
    /// `InTransit` until arrival confirms it.
    pub fn mark_loaded(&mut self, qty: Qty) -> DomainResult<()> {
        self.ensure_open()?;
        if qty < Decimal::ZERO {
            return Err(DomainError::validation("loaded quantity cannot be negative"));
        }
        self.qty_received = clamp_received(self.qty_received + qty, self.quantity);
        self.state = AllocationState::InTransit;
        Ok(())
    }

    /// Departure confirmed without per-unit detail.
    pub fn mark_in_transit(&mut self) {
        if self.state == AllocationState::Pending {
            self.state = AllocationState::InTransit;
        }
    }

    /// Withdraw the commitment. Already-posted consumption stays sunk.
    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.state == AllocationState::Done {
            return Err(DomainError::invariant(
                "completed allocations cannot be cancelled",
            ));
        }
        self.state = AllocationState::Cancelled;
        Ok(())
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.state == AllocationState::Cancelled {
            return Err(DomainError::invariant(
                "cancelled allocations cannot consume material",
            ));
        }
        Ok(())
    }
}

impl Entity for AllocationRecord {
    type Id = AllocationId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
