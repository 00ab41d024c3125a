//! Infrastructure layer: record store, stock reservations, order lifecycle, config.

pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod reservation;
pub mod store;


pub use clock::{Clock, FixedClock, SystemClock};
pub use config::OrderPolicy;
pub use lifecycle::{OrderDetails, OrderLifecycleManager};
pub use reservation::StockReservations;
pub use store::{InMemoryRecordStore, RecordStore, StoreError, StoreTx, StoreView};
