//! `orderdesk-core` — shared domain building blocks.
//!
//! Identifiers, money, the domain error model and the small set of traits every
//! record type implements. This crate contains **pure domain** primitives (no
//! infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use id::{CustomerId, EnterpriseId, OrderId, OrderItemId, ProductId};
pub use money::Money;
pub use value_object::ValueObject;
