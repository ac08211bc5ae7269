use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, RecordId};

/// Party identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub RecordId);

impl PartyId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Role of a party: who we sell to, who we buy from, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Customer,
    Vendor,
    Both,
}

/// Reference entity: a customer or vendor, consumed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    id: PartyId,
    company_id: CompanyId,
    name: String,
    role: PartyRole,
}

impl Party {
    pub fn new(
        id: PartyId,
        company_id: CompanyId,
        name: impl Into<String>,
        role: PartyRole,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("party name cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            name,
            role,
        })
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> PartyRole {
        self.role
    }

    pub fn is_customer(&self) -> bool {
        matches!(self.role, PartyRole::Customer | PartyRole::Both)
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self.role, PartyRole::Vendor | PartyRole::Both)
    }
}

impl Entity for Party {
    type Id = PartyId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_party_id() -> PartyId {
        PartyId::new(RecordId::new())
    }

    #[test]
    fn new_party_rejects_empty_name() {
        let err = Party::new(test_party_id(), CompanyId::new(), "   ", PartyRole::Customer)
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn role_flags_cover_both() {
        let p = Party::new(test_party_id(), CompanyId::new(), "Acme", PartyRole::Both).unwrap();
        assert!(p.is_customer());
        assert!(p.is_vendor());

        let v = Party::new(test_party_id(), CompanyId::new(), "Quarry", PartyRole::Vendor).unwrap();
        assert!(!v.is_customer());
        assert!(v.is_vendor());
    }
}
