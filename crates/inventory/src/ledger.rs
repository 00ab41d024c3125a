use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_core::{DomainError, DomainResult, ValueObject};

/// Upper bound for any product's stock counter.
pub const MAX_STOCK: u32 = 999_999;

/// Non-negative stock counter of a single product.
///
/// The type cannot represent a negative level, and every constructor and
/// movement keeps it within `0..=MAX_STOCK`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StockLevel(u32);

impl ValueObject for StockLevel {}

/// A reservation asked for more than the counter holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("insufficient stock: available {available}, requested {requested}")]
pub struct InsufficientStock {
    pub available: u32,
    pub requested: u32,
}

/// Outcome of a release: the new level and whether it hit `MAX_STOCK`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Released {
    pub level: StockLevel,
    pub capped: bool,
}

impl StockLevel {
    pub const EMPTY: StockLevel = StockLevel(0);

    pub fn new(units: u32) -> DomainResult<Self> {
        if units > MAX_STOCK {
            return Err(DomainError::validation(format!(
                "stock cannot exceed {MAX_STOCK} units (got {units})"
            )));
        }
        Ok(Self(units))
    }

    pub fn units(self) -> u32 {
        self.0
    }

    /// Check-and-decrement. The level is untouched on failure.
    pub fn reserve(self, quantity: u32) -> Result<StockLevel, InsufficientStock> {
        self.0
            .checked_sub(quantity)
            .map(StockLevel)
            .ok_or(InsufficientStock {
                available: self.0,
                requested: quantity,
            })
    }

    /// Unconditional increment, saturating at `MAX_STOCK`.
    pub fn release(self, quantity: u32) -> Released {
        let raw = self.0.saturating_add(quantity);
        Released {
            level: StockLevel(raw.min(MAX_STOCK)),
            capped: raw > MAX_STOCK,
        }
    }
}

impl TryFrom<u32> for StockLevel {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        StockLevel::new(value)
    }
}

impl From<StockLevel> for u32 {
    fn from(value: StockLevel) -> Self {
        value.0
    }
}

impl core::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
