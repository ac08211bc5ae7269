use serde::{Deserialize, Serialize};

use controltower_core::{DomainError, DomainResult, Entity, RecordId};

/// Location identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub RecordId);

impl LocationId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What a location is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUsage {
    Internal,
    Transit,
    Supplier,
    Customer,
}

/// A stock location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    usage: LocationUsage,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>, usage: LocationUsage) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        Ok(Self { id, name, usage })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> LocationUsage {
        self.usage
    }

    /// Transit holding areas are identified by usage, or by name for
    /// warehouses that model transit as a plain internal location.
    pub fn is_transit(&self) -> bool {
        if self.usage == LocationUsage::Transit {
            return true;
        }
        let lower = self.name.to_lowercase();
        lower.contains("transit") || lower.contains("tránsito") || lower.contains("transito")
    }

    pub fn is_internal(&self) -> bool {
        self.usage == LocationUsage::Internal && !self.is_transit()
    }
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
