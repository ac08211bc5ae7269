use serde::{Deserialize, Serialize};

use controltower_core::{DomainError, DomainResult, Entity, RecordId};

/// Lot identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub RecordId);

impl LotId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A uniquely identified physical unit (slab/plate/batch) of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    id: LotId,
    /// Lot name as printed on the unit, e.g. "PL-20431".
    name: String,
    /// Container the unit travels in, read from the vendor packing list.
    container_ref: Option<String>,
}

impl Lot {
    pub fn new(id: LotId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("lot name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            container_ref: None,
        })
    }

    pub fn with_container_ref(mut self, container: impl Into<String>) -> Self {
        self.container_ref = Some(container.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container_ref(&self) -> Option<&str> {
        self.container_ref.as_deref()
    }
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
