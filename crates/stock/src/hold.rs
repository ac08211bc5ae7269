use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, Entity, RecordId, UserId};
use controltower_parties::PartyId;

use crate::lot::LotId;
use crate::quant::QuantId;

/// Hold identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HoldId(pub RecordId);

impl HoldId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for HoldId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldState {
    Active,
    Cancelled,
}

/// An exclusive reservation of one physical unit for one customer.
///
/// At most one hold per quant is `Active` at any time; `StockIndex`
/// enforces that on placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    id: HoldId,
    company_id: CompanyId,
    lot_id: LotId,
    quant_id: QuantId,
    partner_id: PartyId,
    placed_by: UserId,
    started_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    note: String,
    state: HoldState,
}

impl Hold {
    /// Default hold window before a commercial follow-up is expected.
    pub const DEFAULT_WINDOW_DAYS: i64 = 30;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: HoldId,
        company_id: CompanyId,
        lot_id: LotId,
        quant_id: QuantId,
        partner_id: PartyId,
        placed_by: UserId,
        started_at: DateTime<Utc>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id,
            company_id,
            lot_id,
            quant_id,
            partner_id,
            placed_by,
            started_at,
            expires_at: started_at + chrono::Duration::days(Self::DEFAULT_WINDOW_DAYS),
            note: note.into(),
            state: HoldState::Active,
        }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn quant_id(&self) -> QuantId {
        self.quant_id
    }

    pub fn partner_id(&self) -> PartyId {
        self.partner_id
    }

    pub fn placed_by(&self) -> UserId {
        self.placed_by
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == HoldState::Active
    }

    pub fn cancel(&mut self) {
        self.state = HoldState::Cancelled;
    }
}

impl Entity for Hold {
    type Id = HoldId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
