//! Inventory ledger (stock counters embedded in product records).
//!
//! This crate contains the stock arithmetic and the stock movement events,
//! implemented purely as deterministic domain logic (no IO, no storage). The
//! atomicity of a reservation is the record store's job; the ledger only
//! decides whether a movement is allowed and what the new level is.

pub mod ledger;
pub mod movement;

pub use ledger::{InsufficientStock, MAX_STOCK, Released, StockLevel};
pub use movement::{InventoryEvent, MovementDirection, StockMovement, StockReleased, StockReserved};
