use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_parties::PartyId;
use controltower_products::ProductId;

/// Purchase order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub RecordId);

impl PurchaseOrderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase line identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseLineId(pub RecordId);

impl PurchaseLineId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle (external workflow; consumed read-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseState {
    Draft,
    Sent,
    Confirmed,
    Cancelled,
}

impl PurchaseState {
    /// Editable states: consolidation may still append lines.
    pub fn accepts_lines(self) -> bool {
        matches!(self, PurchaseState::Draft | PurchaseState::Sent)
    }

    /// Open states for the demand board's on-order figure.
    pub fn is_open(self) -> bool {
        !matches!(self, PurchaseState::Cancelled)
    }
}

/// Purchase order header: one vendor-side commitment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    company_id: CompanyId,
    /// Document reference, e.g. "P00017".
    reference: String,
    vendor_id: PartyId,
    /// Vendor-side reference (quote number, BL candidate).
    vendor_reference: Option<String>,
    state: PurchaseState,
    /// Source documents, comma-joined without duplicates.
    origin: String,
    created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(
        id: PurchaseOrderId,
        company_id: CompanyId,
        reference: impl Into<String>,
        vendor_id: PartyId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::validation(
                "purchase order reference cannot be empty",
            ));
        }
        Ok(Self {
            id,
            company_id,
            reference,
            vendor_id,
            vendor_reference: None,
            state: PurchaseState::Draft,
            origin: String::new(),
            created_at,
        })
    }

    pub fn with_vendor_reference(mut self, vendor_ref: impl Into<String>) -> Self {
        self.vendor_reference = Some(vendor_ref.into());
        self
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn vendor_id(&self) -> PartyId {
        self.vendor_id
    }

    pub fn vendor_reference(&self) -> Option<&str> {
        self.vendor_reference.as_deref()
    }

    pub fn state(&self) -> PurchaseState {
        self.state
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Merge source-document references into `origin`, skipping ones already
    /// present.
    pub fn merge_origin<'a>(&mut self, references: impl IntoIterator<Item = &'a str>) {
        for reference in references {
            if reference.is_empty() || self.origin.contains(reference) {
                continue;
            }
            if self.origin.is_empty() {
                self.origin.push_str(reference);
            } else {
                self.origin.push_str(", ");
                self.origin.push_str(reference);
            }
        }
    }

    /// Workflow transitions are owned by the purchasing collaborator; the
    /// core only observes them.
    pub fn set_state(&mut self, state: PurchaseState) {
        self.state = state;
    }

    /// Vendor document reference, usually learned after confirmation.
    pub fn set_vendor_reference(&mut self, vendor_ref: impl Into<String>) {
        self.vendor_reference = Some(vendor_ref.into());
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Purchase line: vendor-side commitment for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    id: PurchaseLineId,
    order_id: PurchaseOrderId,
    product_id: ProductId,
    quantity: Qty,
    received_qty: Qty,
    /// Unit price in smallest currency unit; pass-through from the product's
    /// standard cost at consolidation time.
    price_unit: u64,
    description: String,
}

impl PurchaseLine {
    pub fn new(
        id: PurchaseLineId,
        order_id: PurchaseOrderId,
        product_id: ProductId,
        quantity: Qty,
        price_unit: u64,
        description: impl Into<String>,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation(
                "purchase line quantity must be positive",
            ));
        }
        Ok(Self {
            id,
            order_id,
            product_id,
            quantity,
            received_qty: Decimal::ZERO,
            price_unit,
            description: description.into(),
        })
    }

    pub fn order_id(&self) -> PurchaseOrderId {
        self.order_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    pub fn received_qty(&self) -> Qty {
        self.received_qty
    }

    pub fn price_unit(&self) -> u64 {
        self.price_unit
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Ordered but not yet received.
    pub fn outstanding(&self) -> Qty {
        let out = self.quantity - self.received_qty;
        if out < Decimal::ZERO { Decimal::ZERO } else { out }
    }

    /// Consolidation appends demand onto an existing line for the same
    /// product instead of duplicating it.
    pub fn increase_quantity(&mut self, extra: Qty) -> DomainResult<()> {
        if extra <= Decimal::ZERO {
            return Err(DomainError::validation("quantity increase must be positive"));
        }
        self.quantity += extra;
        Ok(())
    }

    pub fn record_received(&mut self, qty: Qty) {
        self.received_qty += qty;
    }
}

impl Entity for PurchaseLine {
    type Id = PurchaseLineId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
