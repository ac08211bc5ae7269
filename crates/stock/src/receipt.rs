use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, Qty, RecordId};
use controltower_orders::PurchaseOrderId;
use controltower_products::ProductId;

use crate::location::LocationId;
use crate::lot::LotId;

/// Receipt identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub RecordId);

impl ReceiptId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Inbound movement state, driven by the warehouse engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptState {
    Draft,
    Ready,
    Done,
    Cancelled,
}

/// One received (or expected) unit line inside a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_id: ProductId,
    /// Absent while the vendor has not communicated unit identities yet.
    pub lot_id: Option<LotId>,
    pub quantity: Qty,
}

/// Physical receipt movement (external contract).
///
/// This core reads its lines and state but never completes it: validation
/// stays with the warehouse operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    id: ReceiptId,
    company_id: CompanyId,
    reference: String,
    /// Source document reference ("P00017" or a vendor packing list).
    origin: Option<String>,
    purchase_id: Option<PurchaseOrderId>,
    destination: LocationId,
    state: ReceiptState,
    lines: Vec<ReceiptLine>,
    /// Manual overrides captured on the document.
    container_ref: Option<String>,
    bl_ref: Option<String>,
}

impl Receipt {
    pub fn new(
        id: ReceiptId,
        company_id: CompanyId,
        reference: impl Into<String>,
        destination: LocationId,
    ) -> DomainResult<Self> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::validation("receipt reference cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            reference,
            origin: None,
            purchase_id: None,
            destination,
            state: ReceiptState::Draft,
            lines: Vec::new(),
            container_ref: None,
            bl_ref: None,
        })
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_purchase(mut self, purchase_id: PurchaseOrderId) -> Self {
        self.purchase_id = Some(purchase_id);
        self
    }

    pub fn with_container_ref(mut self, container: impl Into<String>) -> Self {
        self.container_ref = Some(container.into());
        self
    }

    pub fn with_bl_ref(mut self, bl: impl Into<String>) -> Self {
        self.bl_ref = Some(bl.into());
        self
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn purchase_id(&self) -> Option<PurchaseOrderId> {
        self.purchase_id
    }

    pub fn destination(&self) -> LocationId {
        self.destination
    }

    pub fn state(&self) -> ReceiptState {
        self.state
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn container_ref(&self) -> Option<&str> {
        self.container_ref.as_deref()
    }

    pub fn bl_ref(&self) -> Option<&str> {
        self.bl_ref.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.state == ReceiptState::Done
    }

    pub fn push_line(&mut self, line: ReceiptLine) -> DomainResult<()> {
        if self.state == ReceiptState::Done {
            return Err(DomainError::invariant(
                "cannot add lines to a completed receipt",
            ));
        }
        if line.quantity <= rust_decimal::Decimal::ZERO {
            return Err(DomainError::validation(
                "receipt line quantity must be positive",
            ));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Warehouse-side transition; the allocation core never calls this on
    /// its own initiative.
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.state != ReceiptState::Draft {
            return Err(DomainError::invariant("only draft receipts can be confirmed"));
        }
        self.state = ReceiptState::Ready;
        Ok(())
    }

    /// Warehouse-side completion.
    pub fn mark_done(&mut self) -> DomainResult<()> {
        if self.state == ReceiptState::Cancelled {
            return Err(DomainError::invariant("cancelled receipts cannot complete"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot complete a receipt without lines",
            ));
        }
        self.state = ReceiptState::Done;
        Ok(())
    }
}

impl Entity for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
