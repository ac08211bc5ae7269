use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use controltower_core::{Entity, Qty, RecordId};
use controltower_products::ProductId;

use crate::location::LocationId;
use crate::lot::LotId;

/// Quant identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantId(pub RecordId);

impl QuantId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for QuantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Physical stock unit record: a lot of a product sitting at a location.
///
/// Owned by the warehouse engine; the core only queries it and points holds
/// at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quant {
    id: QuantId,
    lot_id: LotId,
    product_id: ProductId,
    location_id: LocationId,
    quantity: Qty,
    /// When the quant appeared at this location; recovery searches prefer
    /// the most recent one.
    recorded_at: DateTime<Utc>,
}

impl Quant {
    pub fn new(
        id: QuantId,
        lot_id: LotId,
        product_id: ProductId,
        location_id: LocationId,
        quantity: Qty,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            lot_id,
            product_id,
            location_id,
            quantity,
            recorded_at,
        }
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn quantity(&self) -> Qty {
        self.quantity
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn has_stock(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

impl Entity for Quant {
    type Id = QuantId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
