//! Sales orders: records, status state machine and the validation pipeline.
//!
//! This crate contains the business rules for orders, implemented purely as
//! deterministic domain logic (no IO, no storage). Lookups of referenced
//! records go through the [`ReferenceLookup`] trait, which the infra layer
//! implements on top of its record store.

pub mod events;
pub mod limits;
pub mod order;
pub mod status;
pub mod validation;

pub use events::{
    OrderCreated, OrderDeleted, OrderEvent, OrderItemsReplaced, OrderStatusChanged, OrderUpdated,
};
pub use limits::OrderLimits;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderPatch};
pub use status::OrderStatus;
pub use validation::{
    ReferenceLookup, ValidatedItem, ValidatedOrder, ValidatedPatch, ValidationPipeline,
};
