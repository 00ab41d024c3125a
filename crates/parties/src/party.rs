use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{CustomerId, DomainError, DomainResult, EnterpriseId, Entity};

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A customer that places orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        contact: ContactInfo,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: CustomerId::new(),
            name: required_name(name.into(), "customer")?,
            contact,
            created_at: now,
        })
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An enterprise owning a product catalog and receiving orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub legal_name: String,
    pub trade_name: String,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Enterprise {
    pub fn new(
        legal_name: impl Into<String>,
        trade_name: impl Into<String>,
        contact: ContactInfo,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: EnterpriseId::new(),
            legal_name: required_name(legal_name.into(), "enterprise legal name")?,
            trade_name: required_name(trade_name.into(), "enterprise trade name")?,
            contact,
            created_at: now,
        })
    }
}

impl Entity for Enterprise {
    type Id = EnterpriseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn required_name(name: String, what: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_name_is_trimmed_and_required() {
        let c = Customer::new("  Ana  ", ContactInfo::default(), Utc::now()).unwrap();
        assert_eq!(c.name, "Ana");

        let err = Customer::new("   ", ContactInfo::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("customer")));
    }

    #[test]
    fn enterprise_requires_both_names() {
        assert!(Enterprise::new("Acme Ltda", "Acme", ContactInfo::default(), Utc::now()).is_ok());
        assert!(Enterprise::new("Acme Ltda", "", ContactInfo::default(), Utc::now()).is_err());
    }
}
