//! Stock reservation coordinator.
//!
//! Reserve and release are the only writers of a product's stock counter.
//! Each one is a version-guarded read-modify-write of the product record,
//! issued inside the caller's store transaction. Store transactions are
//! serialized, so a reserve is a single atomic check-and-decrement and two
//! movements on the same product never interleave.
//!
//! Every order item reserves exactly once when it is added and releases
//! exactly once when it is removed. The coordinator does not track that
//! pairing itself; the lifecycle manager does, through the persisted items.

use std::sync::Arc;

use tracing::{instrument, warn};

use orderdesk_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, ProductId};
use orderdesk_inventory::{MovementDirection, StockMovement};
use orderdesk_products::Product;

use crate::clock::{Clock, SystemClock};
use crate::store::{RecordStore, StoreTx};

#[derive(Clone)]
pub struct StockReservations {
    clock: Arc<dyn Clock>,
}

impl Default for StockReservations {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl core::fmt::Debug for StockReservations {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockReservations").finish_non_exhaustive()
    }
}

impl StockReservations {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Take `quantity` units out of stock.
    ///
    /// Fails with [`DomainError::Availability`] naming the current stock when
    /// it does not cover `quantity`; the product is left untouched.
    #[instrument(skip(self, tx), fields(product_id = %product_id))]
    pub fn reserve(
        &self,
        tx: &mut dyn StoreTx,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<StockMovement> {
        ensure_positive(quantity)?;
        let product = load(tx, product_id)?;
        let before = product.stock();

        let after = before.reserve(quantity).map_err(|short| {
            warn!(
                available = short.available,
                requested = short.requested,
                "stock reservation rejected"
            );
            DomainError::availability(product_id, product.name(), short.available, short.requested)
        })?;

        tx.save_product(
            product.with_stock(after, self.clock.now()),
            ExpectedVersion::Exact(product.version()),
        )?;

        Ok(movement(&product, MovementDirection::Reserved, quantity, after.units()))
    }

    /// Put `quantity` units back. Never fails on the counter itself; the
    /// level saturates at the stock cap.
    #[instrument(skip(self, tx), fields(product_id = %product_id))]
    pub fn release(
        &self,
        tx: &mut dyn StoreTx,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<StockMovement> {
        ensure_positive(quantity)?;
        let product = load(tx, product_id)?;

        let released = product.stock().release(quantity);
        if released.capped {
            warn!(
                stock = product.stock().units(),
                quantity, "stock release capped at maximum stock"
            );
        }

        tx.save_product(
            product.with_stock(released.level, self.clock.now()),
            ExpectedVersion::Exact(product.version()),
        )?;

        Ok(movement(&product, MovementDirection::Released, quantity, released.level.units()))
    }

    /// Reserve in a transaction of its own.
    pub fn reserve_stock<S>(
        &self,
        store: &S,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<StockMovement>
    where
        S: RecordStore,
    {
        store.transaction(|tx| self.reserve(tx, product_id, quantity))
    }

    /// Release in a transaction of its own.
    pub fn release_stock<S>(
        &self,
        store: &S,
        product_id: ProductId,
        quantity: u32,
    ) -> DomainResult<StockMovement>
    where
        S: RecordStore,
    {
        store.transaction(|tx| self.release(tx, product_id, quantity))
    }
}

fn ensure_positive(quantity: u32) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation("stock movement quantity must be greater than zero"));
    }
    Ok(())
}

fn load(tx: &dyn StoreTx, product_id: ProductId) -> DomainResult<Product> {
    tx.product(product_id)
        .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))
}

fn movement(
    product: &Product,
    direction: MovementDirection,
    quantity: u32,
    stock_after: u32,
) -> StockMovement {
    StockMovement {
        product_id: product.id_typed(),
        enterprise_id: product.enterprise_id(),
        direction,
        quantity,
        stock_before: product.stock().units(),
        stock_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_core::{EnterpriseId, Money};
    use orderdesk_inventory::MAX_STOCK;
    use orderdesk_products::NewProduct;

    use crate::store::InMemoryRecordStore;

    fn seeded(stock: u32) -> (InMemoryRecordStore, ProductId) {
        let store = InMemoryRecordStore::new();
        let product = Product::new(
            NewProduct {
                enterprise_id: EnterpriseId::new(),
                name: "Widget".to_string(),
                description: String::new(),
                price: Money::from_major(10),
                stock,
            },
            Utc::now(),
        )
        .unwrap();
        let id = product.id_typed();
        store.transaction(|tx| tx.insert_product(product)).unwrap();
        (store, id)
    }

    fn stock(store: &InMemoryRecordStore, id: ProductId) -> u32 {
        store.read(|v| v.product(id)).unwrap().unwrap().stock().units()
    }

    #[test]
    fn reserve_decrements_and_reports_the_movement() {
        let (store, id) = seeded(100);
        let reservations = StockReservations::default();

        let m = reservations.reserve_stock(&store, id, 5).unwrap();

        assert_eq!((m.stock_before, m.stock_after), (100, 95));
        assert_eq!(m.direction, MovementDirection::Reserved);
        assert_eq!(stock(&store, id), 95);
    }

    #[test]
    fn insufficient_stock_leaves_the_counter_alone() {
        let (store, id) = seeded(3);
        let reservations = StockReservations::default();

        match reservations.reserve_stock(&store, id, 4).unwrap_err() {
            DomainError::Availability { available, requested, .. } => {
                assert_eq!((available, requested), (3, 4));
            }
            other => panic!("Expected Availability error, got {other:?}"),
        }
        assert_eq!(stock(&store, id), 3);
    }

    #[test]
    fn reserving_everything_is_allowed() {
        let (store, id) = seeded(7);
        let reservations = StockReservations::default();
        reservations.reserve_stock(&store, id, 7).unwrap();
        assert_eq!(stock(&store, id), 0);
    }

    #[test]
    fn release_saturates_at_the_cap() {
        let (store, id) = seeded(MAX_STOCK - 2);
        let reservations = StockReservations::default();

        let m = reservations.release_stock(&store, id, 10).unwrap();

        assert_eq!(m.stock_after, MAX_STOCK);
        assert_eq!(m.applied(), 2);
        assert_eq!(stock(&store, id), MAX_STOCK);
    }

    #[test]
    fn unknown_product_and_zero_quantity_are_rejected() {
        let (store, id) = seeded(10);
        let reservations = StockReservations::default();

        assert!(matches!(
            reservations.reserve_stock(&store, ProductId::new(), 1),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            reservations.release_stock(&store, id, 0),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn each_movement_bumps_the_product_version() {
        let (store, id) = seeded(10);
        let reservations = StockReservations::default();
        reservations.reserve_stock(&store, id, 1).unwrap();
        reservations.release_stock(&store, id, 1).unwrap();

        let p = store.read(|v| v.product(id)).unwrap().unwrap();
        assert_eq!(p.version(), 3);
        assert_eq!(p.stock().units(), 10);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Reserve(u32),
            Release(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..=60).prop_map(Op::Reserve),
                (1u32..=60).prop_map(Op::Release),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            /// Property: the stored counter always equals a saturating model
            /// of the accepted movements, and rejected reserves change nothing.
            #[test]
            fn counter_tracks_accepted_movements(
                initial in 0u32..=200,
                ops in prop::collection::vec(op(), 0..40),
            ) {
                let (store, id) = seeded(initial);
                let reservations = StockReservations::default();
                let mut model = initial;

                for op in ops {
                    match op {
                        Op::Reserve(q) => match reservations.reserve_stock(&store, id, q) {
                            Ok(_) => {
                                prop_assert!(model >= q);
                                model -= q;
                            }
                            Err(e) => {
                                prop_assert!(e.is_retryable());
                                prop_assert!(model < q);
                            }
                        },
                        Op::Release(q) => {
                            reservations.release_stock(&store, id, q).unwrap();
                            model = (model + q).min(MAX_STOCK);
                        }
                    }
                    prop_assert_eq!(stock(&store, id), model);
                }
            }
        }
    }
}
