use serde::{Deserialize, Serialize};

use controltower_core::{CompanyId, DomainError, DomainResult, Entity, RecordId};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub RecordId);

impl ProductId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Pass-through pricing, in smallest currency unit (e.g. cents).
///
/// `preferred_price` is the customer-agreed price; reservation lines use it
/// when present and fall back to `list_price`. `standard_cost` seeds new
/// purchase commitment lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub standard_cost: u64,
    pub list_price: u64,
    pub preferred_price: Option<u64>,
}

impl Pricing {
    /// Reference price for a customer reservation line.
    pub fn reservation_price(&self) -> u64 {
        self.preferred_price.unwrap_or(self.list_price)
    }
}

/// Reference entity: a product, consumed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    company_id: CompanyId,
    sku: String,
    name: String,
    pricing: Pricing,
}

impl Product {
    pub fn new(
        id: ProductId,
        company_id: CompanyId,
        sku: impl Into<String>,
        name: impl Into<String>,
        pricing: Pricing,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        let name = name.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            company_id,
            sku,
            name,
            pricing,
        })
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pricing() -> Pricing {
        Pricing {
            standard_cost: 1_500,
            list_price: 2_400,
            preferred_price: None,
        }
    }

    #[test]
    fn reservation_price_prefers_agreed_price() {
        let mut pricing = test_pricing();
        assert_eq!(pricing.reservation_price(), 2_400);

        pricing.preferred_price = Some(2_100);
        assert_eq!(pricing.reservation_price(), 2_100);
    }

    #[test]
    fn new_product_rejects_blank_sku() {
        let err = Product::new(
            ProductId::new(RecordId::new()),
            CompanyId::new(),
            " ",
            "Granite slab 2cm",
            test_pricing(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank sku"),
        }
    }
}
