use std::sync::Arc;

use thiserror::Error;

use orderdesk_core::{
    CustomerId, DomainError, EnterpriseId, ExpectedVersion, OrderId, ProductId,
};
use orderdesk_parties::{Customer, Enterprise};
use orderdesk_products::Product;
use orderdesk_sales::{Order, OrderItem};

/// Record store operation error.
///
/// These are infrastructure errors (constraints, concurrency, availability of
/// the store itself), as opposed to domain errors. They convert into
/// [`DomainError`] so lifecycle code can propagate them with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A conditional write found a different version than expected.
    #[error("version mismatch on {record}: expected {expected:?}, found {actual}")]
    VersionMismatch {
        record: String,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("record not found: {0}")]
    MissingRecord(String),

    #[error("record store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(msg) => DomainError::conflict(msg),
            e @ StoreError::VersionMismatch { .. } => DomainError::conflict(e.to_string()),
            StoreError::MissingRecord(what) => DomainError::not_found(what),
            StoreError::Poisoned => DomainError::unavailable("record store lock poisoned"),
        }
    }
}

/// Read access to the records.
///
/// Object-safe; lifecycle code works against `&dyn StoreView`.
pub trait StoreView {
    fn customer(&self, id: CustomerId) -> Option<Customer>;

    fn enterprise(&self, id: EnterpriseId) -> Option<Enterprise>;

    fn product(&self, id: ProductId) -> Option<Product>;

    fn order(&self, id: OrderId) -> Option<Order>;

    fn order_by_number(&self, order_number: &str) -> Option<Order>;

    /// All orders, oldest first.
    fn orders(&self) -> Vec<Order>;

    fn items_for_order(&self, order_id: OrderId) -> Vec<OrderItem>;
}

/// Writes available inside a transaction.
///
/// Implementations must:
/// - enforce the unique indexes (order number; product name per enterprise)
/// - enforce `ExpectedVersion` on `save_*` against the stored version
/// - reject `save_*` and `insert_items` for records that do not exist
pub trait StoreTx: StoreView {
    fn insert_customer(&mut self, customer: Customer) -> Result<(), StoreError>;

    fn insert_enterprise(&mut self, enterprise: Enterprise) -> Result<(), StoreError>;

    fn insert_product(&mut self, product: Product) -> Result<(), StoreError>;

    fn save_product(
        &mut self,
        product: Product,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError>;

    fn insert_order(&mut self, order: Order) -> Result<(), StoreError>;

    fn save_order(&mut self, order: Order, expected: ExpectedVersion) -> Result<(), StoreError>;

    /// Remove an order together with any items it still owns.
    fn delete_order(&mut self, id: OrderId) -> Result<Order, StoreError>;

    fn insert_items(&mut self, items: Vec<OrderItem>) -> Result<(), StoreError>;

    /// Remove and return every item of an order.
    fn delete_items(&mut self, order_id: OrderId) -> Vec<OrderItem>;
}

/// A store that runs reads and atomic transactions.
///
/// ## Transaction semantics
///
/// `transaction()` hands the closure a [`StoreTx`]. If the closure returns
/// `Ok`, every write it made becomes visible at once; if it returns `Err`,
/// none of them do. Transactions on the same store are serialized, which is
/// what makes a stock reservation a single atomic check-and-decrement.
pub trait RecordStore: Send + Sync {
    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn StoreView) -> T;

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore,
{
    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn StoreView) -> T,
    {
        (**self).read(f)
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }
}
