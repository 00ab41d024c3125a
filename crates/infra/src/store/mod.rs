//! Record store boundary.
//!
//! Orders, items, products and their referenced parties live in a record store
//! reachable through CRUD-style accessors. Multi-step mutations run inside one
//! [`RecordStore::transaction`], which is all-or-nothing and serializable, so
//! a failure half way through an order mutation leaves nothing behind.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use r#trait::{RecordStore, StoreError, StoreTx, StoreView};
