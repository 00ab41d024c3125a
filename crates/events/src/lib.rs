//! Lifecycle events and their distribution.
//!
//! Domain crates describe what happened as typed [`Event`]s; the infra layer
//! wraps committed events in an [`EventEnvelope`] and fans them out over an
//! [`EventBus`] once the store transaction that produced them has committed.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
