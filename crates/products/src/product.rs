use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{AggregateRoot, DomainError, DomainResult, EnterpriseId, Money, ProductId};
use orderdesk_inventory::StockLevel;

/// Highest accepted unit price (1,000,000.00).
pub const MAX_PRICE: Money = Money::from_major(1_000_000);

pub const MAX_NAME_LEN: usize = 255;

pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Input for registering a product in an enterprise catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub enterprise_id: EnterpriseId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
}

/// Aggregate root: Product.
///
/// `stock` is only ever replaced through [`Product::with_stock`], which the
/// reservation coordinator calls inside a store transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    enterprise_id: EnterpriseId,
    name: String,
    description: String,
    price: Money,
    stock: StockLevel,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Validate catalog fields and build a product at version 1.
    ///
    /// Name uniqueness within the enterprise is checked by the record store.
    pub fn new(input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        if input.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::validation(format!(
                "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        validate_price(input.price)?;
        let stock = StockLevel::new(input.stock)?;

        Ok(Self {
            id: ProductId::new(),
            enterprise_id: input.enterprise_id,
            name: name.to_string(),
            description: input.description,
            price: input.price,
            stock,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn enterprise_id(&self) -> EnterpriseId {
        self.enterprise_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> StockLevel {
        self.stock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn belongs_to(&self, enterprise_id: EnterpriseId) -> bool {
        self.enterprise_id == enterprise_id
    }

    /// Next version of this product with a new stock level.
    pub fn with_stock(&self, stock: StockLevel, now: DateTime<Utc>) -> Product {
        Product {
            stock,
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_price(price: Money) -> DomainResult<()> {
    if !price.is_positive() {
        return Err(DomainError::validation("price must be greater than zero"));
    }
    if price > MAX_PRICE {
        return Err(DomainError::validation(format!("price cannot exceed {MAX_PRICE}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, price: Money, stock: u32) -> NewProduct {
        NewProduct {
            enterprise_id: EnterpriseId::new(),
            name: name.to_string(),
            description: "A thing".to_string(),
            price,
            stock,
        }
    }

    #[test]
    fn new_product_starts_at_version_one() {
        let p = Product::new(input(" Widget ", Money::from_major(10), 100), Utc::now()).unwrap();
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.version(), 1);
        assert_eq!(p.stock().units(), 100);
    }

    #[test]
    fn rejects_non_positive_and_oversized_prices() {
        let too_high = Money::from_cents(MAX_PRICE.cents() + 1);
        for price in [Money::ZERO, Money::from_cents(-1), too_high] {
            let err = Product::new(input("Widget", price, 1), Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{price}");
        }
        assert!(Product::new(input("Widget", MAX_PRICE, 1), Utc::now()).is_ok());
    }

    #[test]
    fn rejects_blank_or_long_names_and_stock_over_cap() {
        assert!(Product::new(input("  ", Money::from_major(1), 1), Utc::now()).is_err());
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(Product::new(input(&long, Money::from_major(1), 1), Utc::now()).is_err());
        let over_cap = input("Widget", Money::from_major(1), 1_000_000);
        assert!(Product::new(over_cap, Utc::now()).is_err());
    }

    #[test]
    fn with_stock_bumps_version_and_keeps_identity() {
        let p = Product::new(input("Widget", Money::from_major(10), 100), Utc::now()).unwrap();
        let next = p.with_stock(StockLevel::new(95).unwrap(), Utc::now());

        assert_eq!(next.id_typed(), p.id_typed());
        assert_eq!(next.version(), 2);
        assert_eq!(next.stock().units(), 95);
        assert_eq!(next.price(), p.price());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every price in (0, MAX_PRICE] is accepted, and nothing else is.
            #[test]
            fn price_bounds(cents in -1_000i64..=(MAX_PRICE.cents() + 1_000)) {
                let result = Product::new(input("Widget", Money::from_cents(cents), 1), Utc::now());
                let expected_ok = cents > 0 && cents <= MAX_PRICE.cents();
                prop_assert_eq!(result.is_ok(), expected_ok);
            }
        }
    }
}
