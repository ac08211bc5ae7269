use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_orders::PurchaseOrderId;
use controltower_stock::ReceiptId;

use crate::line::{AllocationStatus, TransitLine, TransitLineId};

/// Voyage identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoyageId(pub RecordId);

impl VoyageId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VoyageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Voyage lifecycle. Wire names keep the operational vocabulary the
/// logistics team works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoyageStatus {
    #[serde(rename = "solicitud")]
    Requested,
    #[serde(rename = "production")]
    Production,
    #[serde(rename = "booking")]
    Booking,
    #[serde(rename = "puerto_origen")]
    OriginPort,
    #[serde(rename = "on_sea")]
    OnSea,
    #[serde(rename = "puerto_destino")]
    DestinationPort,
    #[serde(rename = "arrived_port")]
    ArrivedPort,
    #[serde(rename = "reception_pending")]
    ReceptionPending,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancel")]
    Cancelled,
}

impl VoyageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VoyageStatus::Delivered | VoyageStatus::Cancelled)
    }

    /// Pre-departure states; `confirm_transit` moves any of them to sea.
    pub fn is_requested_family(self) -> bool {
        matches!(
            self,
            VoyageStatus::Requested
                | VoyageStatus::Production
                | VoyageStatus::Booking
                | VoyageStatus::OriginPort
        )
    }

    fn rank(self) -> u8 {
        match self {
            VoyageStatus::Requested => 0,
            VoyageStatus::Production => 1,
            VoyageStatus::Booking => 2,
            VoyageStatus::OriginPort => 3,
            VoyageStatus::OnSea => 4,
            VoyageStatus::DestinationPort => 5,
            VoyageStatus::ArrivedPort => 6,
            VoyageStatus::ReceptionPending => 7,
            VoyageStatus::Delivered => 8,
            VoyageStatus::Cancelled => 9,
        }
    }
}

/// Quantity rollup, recomputed from the lines on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoyageTotals {
    pub total_qty: Qty,
    pub allocated_qty: Qty,
    /// Allocated share of the load, 0-100.
    pub percent_allocated: u8,
}

/// One logistics movement from origin to warehouse, owning its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voyage {
    id: VoyageId,
    company_id: CompanyId,
    /// Assigned at creation, immutable afterwards.
    reference: String,
    vessel_name: Option<String>,
    voyage_number: Option<String>,
    /// Distinct line containers, or a manual override.
    container_ref: Option<String>,
    bl_ref: Option<String>,
    etd: Option<NaiveDate>,
    eta: Option<NaiveDate>,
    arrival_date: Option<NaiveDate>,
    status: VoyageStatus,
    receipt_id: Option<ReceiptId>,
    purchase_id: Option<PurchaseOrderId>,
    /// Read-only pass-through from the logistics quote, in smallest
    /// currency unit.
    estimated_cost: Option<u64>,
    created_on: NaiveDate,
    lines: Vec<TransitLine>,
}

impl Voyage {
    pub fn new(
        id: VoyageId,
        company_id: CompanyId,
        reference: impl Into<String>,
        created_on: NaiveDate,
    ) -> DomainResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::validation("voyage reference cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            reference,
            vessel_name: None,
            voyage_number: None,
            container_ref: None,
            bl_ref: None,
            etd: None,
            eta: None,
            arrival_date: None,
            status: VoyageStatus::Requested,
            receipt_id: None,
            purchase_id: None,
            estimated_cost: None,
            created_on,
            lines: Vec::new(),
        })
    }

    pub fn with_status(mut self, status: VoyageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_purchase(mut self, purchase_id: PurchaseOrderId) -> Self {
        self.purchase_id = Some(purchase_id);
        self
    }

    pub fn with_receipt(mut self, receipt_id: ReceiptId) -> Self {
        self.receipt_id = Some(receipt_id);
        self
    }

    pub fn with_vessel(mut self, vessel: impl Into<String>) -> Self {
        self.vessel_name = Some(vessel.into());
        self
    }

    pub fn with_voyage_number(mut self, number: impl Into<String>) -> Self {
        self.voyage_number = Some(number.into());
        self
    }

    pub fn with_eta(mut self, eta: NaiveDate) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_etd(mut self, etd: NaiveDate) -> Self {
        self.etd = Some(etd);
        self
    }

    pub fn with_bl_ref(mut self, bl: impl Into<String>) -> Self {
        self.bl_ref = Some(bl.into());
        self
    }

    pub fn with_estimated_cost(mut self, cost: u64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn vessel_name(&self) -> Option<&str> {
        self.vessel_name.as_deref()
    }

    pub fn voyage_number(&self) -> Option<&str> {
        self.voyage_number.as_deref()
    }

    pub fn container_ref(&self) -> Option<&str> {
        self.container_ref.as_deref()
    }

    pub fn bl_ref(&self) -> Option<&str> {
        self.bl_ref.as_deref()
    }

    pub fn etd(&self) -> Option<NaiveDate> {
        self.etd
    }

    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    pub fn arrival_date(&self) -> Option<NaiveDate> {
        self.arrival_date
    }

    pub fn status(&self) -> VoyageStatus {
        self.status
    }

    pub fn receipt_id(&self) -> Option<ReceiptId> {
        self.receipt_id
    }

    pub fn purchase_id(&self) -> Option<PurchaseOrderId> {
        self.purchase_id
    }

    pub fn estimated_cost(&self) -> Option<u64> {
        self.estimated_cost
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn lines(&self) -> &[TransitLine] {
        &self.lines
    }

    pub fn line(&self, id: TransitLineId) -> Option<&TransitLine> {
        self.lines.iter().find(|l| Entity::id(*l) == id)
    }

    pub fn line_mut(&mut self, id: TransitLineId) -> Option<&mut TransitLine> {
        self.lines.iter_mut().find(|l| Entity::id(*l) == id)
    }

    pub fn set_receipt(&mut self, receipt_id: ReceiptId) {
        self.receipt_id = Some(receipt_id);
    }

    pub fn set_eta(&mut self, eta: NaiveDate) {
        self.eta = Some(eta);
    }

    /// Manual container override; line containers replace it on the next
    /// refresh if any are present.
    pub fn set_container_ref(&mut self, container: impl Into<String>) {
        self.container_ref = Some(container.into());
    }

    pub fn push_line(&mut self, line: TransitLine) -> TransitLineId {
        let id = Entity::id(&line);
        self.lines.push(line);
        self.refresh_container_ref();
        id
    }

    /// Drop pre-arrival placeholders, typically right before physical lines
    /// replace them. Returns how many were removed.
    pub fn clear_placeholders(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| !l.is_placeholder());
        before - self.lines.len()
    }

    /// Header container reference: the distinct line containers in first-seen
    /// order, comma-joined and truncated to 50 chars.
    pub fn refresh_container_ref(&mut self) {
        let mut seen: Vec<&str> = Vec::new();
        for line in &self.lines {
            if let Some(container) = line.container() {
                if !container.is_empty() && !seen.contains(&container) {
                    seen.push(container);
                }
            }
        }
        if seen.is_empty() {
            return;
        }
        let joined = seen.join(", ");
        self.container_ref = Some(joined.chars().take(50).collect());
    }

    // --- lifecycle -------------------------------------------------------

    /// Departure confirmation: any pre-departure state goes to sea.
    pub fn confirm_transit(&mut self) -> DomainResult<()> {
        if !self.status.is_requested_family() {
            return Err(DomainError::invariant(format!(
                "voyage {} cannot confirm transit from its current state",
                self.reference
            )));
        }
        self.status = VoyageStatus::OnSea;
        Ok(())
    }

    /// Forward-only step through the intermediate states. Terminal states
    /// are reached through `arrive`/`cancel` only.
    pub fn advance(&mut self, to: VoyageStatus) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant("voyage is already closed"));
        }
        if to.is_terminal() || to.rank() <= self.status.rank() {
            return Err(DomainError::invariant(format!(
                "voyage {} cannot move backwards or jump to a terminal state",
                self.reference
            )));
        }
        self.status = to;
        Ok(())
    }

    /// Close the voyage as delivered, stamping the actual arrival date.
    ///
    /// The open-receipt guard lives in the orchestrator, which sees the
    /// receipt; this transition only rejects closed voyages.
    pub fn arrive(&mut self, on: NaiveDate) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant("voyage is already closed"));
        }
        self.status = VoyageStatus::Delivered;
        self.arrival_date = Some(on);
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invariant("voyage is already closed"));
        }
        self.status = VoyageStatus::Cancelled;
        Ok(())
    }

    // --- derived ---------------------------------------------------------

    /// Progress estimate for dashboards, interpolated between the departure
    /// estimate (falling back to the creation date) and the arrival
    /// estimate. Capped at 95 until delivery actually confirms.
    pub fn progress(&self, today: NaiveDate) -> u8 {
        match self.status {
            VoyageStatus::Delivered => return 100,
            VoyageStatus::Cancelled => return 0,
            _ => {}
        }
        let start = self.etd.unwrap_or(self.created_on);
        let Some(eta) = self.eta else { return 0 };
        if today <= start || eta <= start {
            return 0;
        }
        if today >= eta {
            return 95;
        }
        let span = (eta - start).num_days();
        let elapsed = (today - start).num_days();
        let pct = elapsed * 100 / span;
        pct.min(95) as u8
    }

    pub fn totals(&self) -> VoyageTotals {
        let mut total = Decimal::ZERO;
        let mut allocated = Decimal::ZERO;
        for line in &self.lines {
            total += line.quantity();
            if line.allocation_status() == AllocationStatus::Reserved {
                allocated += line.quantity();
            }
        }
        let percent = if total > Decimal::ZERO {
            (allocated * Decimal::from(100) / total)
                .round()
                .to_u8()
                .unwrap_or(100)
        } else {
            0
        };
        VoyageTotals {
            total_qty: total,
            allocated_qty: allocated,
            percent_allocated: percent,
        }
    }
}

impl Entity for Voyage {
    type Id = VoyageId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
