//! Order lifecycle manager (application-level orchestration).
//!
//! Every mutation follows the same pipeline inside one store transaction:
//!
//! ```text
//! load current records
//!   ↓
//! 1. Validate (pure pipeline over a read-only view of the transaction)
//!   ↓
//! 2. Write order and items
//!   ↓
//! 3. Reserve / release stock per item (atomic check-and-decrement)
//!   ↓
//! commit (or roll back everything on the first error)
//!   ↓
//! 4. Publish lifecycle and stock events
//! ```
//!
//! Events are published only after commit. A publish failure is logged and
//! does not undo the mutation; the record store is the source of truth.
//!
//! Stock pairing: an item reserves when it is inserted and releases when it is
//! deleted (item replacement or order deletion). Cancelling an order does not
//! touch stock; deleting the cancelled order later releases it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use orderdesk_core::{
    AggregateRoot, CustomerId, DomainError, DomainResult, EnterpriseId, ErrorKind, ExpectedVersion,
    OrderId, ProductId,
};
use orderdesk_events::{Event, EventBus, EventEnvelope};
use orderdesk_inventory::StockMovement;
use orderdesk_parties::{Customer, Enterprise};
use orderdesk_products::Product;
use orderdesk_sales::{
    NewOrder, Order, OrderEvent, OrderItem, OrderItemsReplaced, OrderLimits, OrderPatch,
    OrderStatus, OrderUpdated, ReferenceLookup, ValidationPipeline,
};

use crate::clock::{Clock, SystemClock};
use crate::config::OrderPolicy;
use crate::reservation::StockReservations;
use crate::store::{RecordStore, StoreTx, StoreView};

pub const ORDER_AGGREGATE: &str = "sales.order";
pub const PRODUCT_AGGREGATE: &str = "inventory.product";

/// An order with its items and the parties it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Customer,
    pub enterprise: Enterprise,
}

/// Orchestrates create, read, update, status change and delete of orders.
///
/// ## Generic Parameters
///
/// - `S`: record store holding orders, items, products and parties
/// - `B`: bus receiving committed lifecycle events
pub struct OrderLifecycleManager<S, B> {
    store: S,
    bus: B,
    limits: OrderLimits,
    clock: Arc<dyn Clock>,
    reservations: StockReservations,
}

impl<S, B> OrderLifecycleManager<S, B>
where
    S: RecordStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B, policy: OrderPolicy) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            store,
            bus,
            limits: policy.into(),
            reservations: StockReservations::new(clock.clone()),
            clock,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.reservations = StockReservations::new(clock.clone());
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> &OrderLimits {
        &self.limits
    }

    /// Validate, persist and reserve stock for a new Pending order.
    #[instrument(
        skip(self, input),
        fields(
            order_number = %input.order_number,
            customer_id = %input.customer_id,
            enterprise_id = %input.enterprise_id,
        )
    )]
    pub fn create(&self, input: NewOrder) -> DomainResult<OrderDetails> {
        let now = self.clock.now();
        let pipeline = ValidationPipeline::new(&self.limits, self.clock.today());

        let (details, movements) = self
            .store
            .transaction(|tx| {
                let validated = pipeline.validate_create(&input, &StoreLookup(&*tx))?;
                let (order, items) = Order::create(validated, now);

                tx.insert_order(order.clone())?;
                tx.insert_items(items.clone())?;

                let mut movements = Vec::with_capacity(items.len());
                for item in &items {
                    movements.push(self.reservations.reserve(tx, item.product_id, item.quantity)?);
                }

                let details = hydrate(&*tx, order, items)?;
                Ok::<_, DomainError>((details, movements))
            })
            .inspect_err(|e| log_rejection("create", e))?;

        let order = &details.order;
        info!(
            order_id = %order.id_typed(),
            total = %order.total_amount(),
            items = details.items.len(),
            "order created"
        );

        self.publish_order(&OrderEvent::created(order, &details.items, now));
        self.publish_movements(order.id_typed(), movements, now);
        Ok(details)
    }

    pub fn get(&self, id: OrderId) -> DomainResult<OrderDetails> {
        ensure_order_id(id)?;
        self.store.read(|view| {
            let order = view.order(id).ok_or_else(|| order_not_found(id))?;
            let items = view.items_for_order(id);
            hydrate(view, order, items)
        })?
    }

    pub fn list_all(&self) -> DomainResult<Vec<OrderDetails>> {
        self.store.read(|view| hydrate_all(view, view.orders()))?
    }

    pub fn list_by_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<OrderDetails>> {
        self.store.read(|view| {
            if view.customer(customer_id).is_none() {
                return Err(DomainError::not_found(format!("customer {customer_id}")));
            }
            let orders = view
                .orders()
                .into_iter()
                .filter(|o| o.customer_id() == customer_id)
                .collect();
            hydrate_all(view, orders)
        })?
    }

    pub fn list_by_enterprise(
        &self,
        enterprise_id: EnterpriseId,
    ) -> DomainResult<Vec<OrderDetails>> {
        self.store.read(|view| {
            if view.enterprise(enterprise_id).is_none() {
                return Err(DomainError::not_found(format!("enterprise {enterprise_id}")));
            }
            let orders = view
                .orders()
                .into_iter()
                .filter(|o| o.enterprise_id() == enterprise_id)
                .collect();
            hydrate_all(view, orders)
        })?
    }

    /// Apply a partial update.
    ///
    /// Only a supplied item list touches stock: every current item is
    /// released and deleted, then the new items are inserted and reserved.
    #[instrument(
        skip(self, patch),
        fields(order_id = %id, replaces_items = patch.replaces_items())
    )]
    pub fn update(&self, id: OrderId, patch: OrderPatch) -> DomainResult<OrderDetails> {
        ensure_order_id(id).inspect_err(|e| log_rejection("update", e))?;
        let now = self.clock.now();
        let pipeline = ValidationPipeline::new(&self.limits, self.clock.today());

        let (details, previous_status, changed, movements) = self
            .store
            .transaction(|tx| {
                let existing = load_order(&*tx, id)?;
                let existing_items = tx.items_for_order(id);
                let lookup = StoreLookup(&*tx);
                let validated =
                    pipeline.validate_update(&existing, &existing_items, &patch, &lookup)?;

                let mut movements = Vec::new();
                let items = match &validated.items {
                    Some(new_items) => {
                        for item in tx.delete_items(id) {
                            let released =
                                self.reservations.release(tx, item.product_id, item.quantity)?;
                            movements.push(released);
                        }
                        let fresh = existing.replacement_items(new_items, now);
                        tx.insert_items(fresh.clone())?;
                        for item in &fresh {
                            let reserved =
                                self.reservations.reserve(tx, item.product_id, item.quantity)?;
                            movements.push(reserved);
                        }
                        fresh
                    }
                    None => existing_items,
                };

                let changed = validated.changed_fields();
                let order = if changed.is_empty() {
                    existing.clone()
                } else {
                    let next = existing.apply_patch(&validated, now);
                    tx.save_order(next.clone(), ExpectedVersion::Exact(existing.version()))?;
                    next
                };

                let details = hydrate(&*tx, order, items)?;
                Ok::<_, DomainError>((details, existing.status(), changed, movements))
            })
            .inspect_err(|e| log_rejection("update", e))?;

        let order = &details.order;
        if changed.is_empty() {
            debug!("update changed nothing");
            return Ok(details);
        }
        info!(changed = ?changed, version = order.version(), "order updated");

        let header: Vec<String> = changed
            .iter()
            .filter(|f| !matches!(**f, "items" | "status"))
            .map(|f| f.to_string())
            .collect();
        if !header.is_empty() {
            self.publish_order(&OrderEvent::OrderUpdated(OrderUpdated {
                order_id: order.id_typed(),
                enterprise_id: order.enterprise_id(),
                changed_fields: header,
                version: order.version(),
                occurred_at: now,
            }));
        }
        if changed.contains(&"items") {
            self.publish_order(&OrderEvent::OrderItemsReplaced(OrderItemsReplaced {
                order_id: order.id_typed(),
                enterprise_id: order.enterprise_id(),
                item_count: details.items.len(),
                total_amount: order.total_amount(),
                occurred_at: now,
            }));
        }
        if order.status() != previous_status {
            self.publish_order(&OrderEvent::status_changed(order, previous_status, now));
        }
        self.publish_movements(order.id_typed(), movements, now);
        Ok(details)
    }

    /// Move an order through the status state machine. Does not touch stock.
    #[instrument(skip(self), fields(order_id = %id))]
    pub fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<OrderDetails> {
        ensure_order_id(id).inspect_err(|e| log_rejection("update_status", e))?;
        let now = self.clock.now();

        let (details, from) = self
            .store
            .transaction(|tx| {
                let existing = load_order(&*tx, id)?;
                let target = existing.status().transition(status)?;
                let next = existing.with_status(target, now);
                tx.save_order(next.clone(), ExpectedVersion::Exact(existing.version()))?;

                let items = tx.items_for_order(id);
                let details = hydrate(&*tx, next, items)?;
                Ok::<_, DomainError>((details, existing.status()))
            })
            .inspect_err(|e| log_rejection("update_status", e))?;

        info!(from = %from, to = %details.order.status(), "order status changed");
        self.publish_order(&OrderEvent::status_changed(&details.order, from, now));
        Ok(details)
    }

    /// Release every item's stock, then remove the items and the order.
    #[instrument(skip(self), fields(order_id = %id))]
    pub fn delete(&self, id: OrderId) -> DomainResult<()> {
        ensure_order_id(id).inspect_err(|e| log_rejection("delete", e))?;
        let now = self.clock.now();

        let (order, movements) = self
            .store
            .transaction(|tx| {
                let existing = load_order(&*tx, id)?;
                existing.ensure_deletable()?;

                let mut movements = Vec::new();
                for item in tx.delete_items(id) {
                    movements.push(self.reservations.release(tx, item.product_id, item.quantity)?);
                }
                let order = tx.delete_order(id)?;
                Ok::<_, DomainError>((order, movements))
            })
            .inspect_err(|e| log_rejection("delete", e))?;

        info!(order_number = %order.order_number(), released = movements.len(), "order deleted");
        self.publish_order(&OrderEvent::deleted(&order, now));
        self.publish_movements(id, movements, now);
        Ok(())
    }

    fn publish_order(&self, event: &OrderEvent) {
        self.publish(event.enterprise_id(), *event.order_id().as_uuid(), ORDER_AGGREGATE, event);
    }

    fn publish_movements(
        &self,
        order_id: OrderId,
        movements: Vec<StockMovement>,
        now: DateTime<Utc>,
    ) {
        for movement in movements {
            let event = movement.into_event(Some(order_id), now);
            let product_id = *event.product_id().as_uuid();
            self.publish(event.enterprise_id(), product_id, PRODUCT_AGGREGATE, &event);
        }
    }

    fn publish<E>(
        &self,
        enterprise_id: EnterpriseId,
        aggregate_id: Uuid,
        aggregate_type: &str,
        event: &E,
    ) where
        E: Event + Serialize,
    {
        let envelope =
            match EventEnvelope::from_typed(enterprise_id, aggregate_id, aggregate_type, event) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(
                        event_type = event.event_type(),
                        error = %err,
                        "failed to serialize lifecycle event"
                    );
                    return;
                }
            };
        if let Err(err) = self.bus.publish(envelope) {
            warn!(
                event_type = event.event_type(),
                error = ?err,
                "failed to publish lifecycle event"
            );
        }
    }
}

/// [`ReferenceLookup`] over any store view, including an open transaction.
struct StoreLookup<'a, V: ?Sized>(&'a V);

impl<V> ReferenceLookup for StoreLookup<'_, V>
where
    V: StoreView + ?Sized,
{
    fn customer_exists(&self, id: CustomerId) -> bool {
        self.0.customer(id).is_some()
    }

    fn enterprise_exists(&self, id: EnterpriseId) -> bool {
        self.0.enterprise(id).is_some()
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        self.0.product(id)
    }

    fn order_number_owner(&self, order_number: &str) -> Option<OrderId> {
        self.0.order_by_number(order_number).map(|o| o.id_typed())
    }
}

fn load_order(tx: &dyn StoreTx, id: OrderId) -> DomainResult<Order> {
    tx.order(id).ok_or_else(|| order_not_found(id))
}

fn ensure_order_id(id: OrderId) -> DomainResult<()> {
    if id.is_nil() {
        return Err(DomainError::validation("order id must not be empty"));
    }
    Ok(())
}

fn order_not_found(id: OrderId) -> DomainError {
    DomainError::not_found(format!("order {id}"))
}

fn hydrate<V>(view: &V, order: Order, items: Vec<OrderItem>) -> DomainResult<OrderDetails>
where
    V: StoreView + ?Sized,
{
    let customer = view.customer(order.customer_id()).ok_or_else(|| {
        DomainError::invariant(format!(
            "order {} references missing customer {}",
            order.id_typed(),
            order.customer_id()
        ))
    })?;
    let enterprise = view.enterprise(order.enterprise_id()).ok_or_else(|| {
        DomainError::invariant(format!(
            "order {} references missing enterprise {}",
            order.id_typed(),
            order.enterprise_id()
        ))
    })?;
    Ok(OrderDetails {
        order,
        items,
        customer,
        enterprise,
    })
}

fn hydrate_all<V>(view: &V, orders: Vec<Order>) -> DomainResult<Vec<OrderDetails>>
where
    V: StoreView + ?Sized,
{
    orders
        .into_iter()
        .map(|order| {
            let items = view.items_for_order(order.id_typed());
            hydrate(view, order, items)
        })
        .collect()
}

fn log_rejection(operation: &'static str, err: &DomainError) {
    match err.kind() {
        ErrorKind::Availability | ErrorKind::Conflict => {
            warn!(operation, error = %err, "order mutation rejected");
        }
        ErrorKind::Internal => error!(operation, error = %err, "order mutation failed"),
        ErrorKind::Validation | ErrorKind::NotFound => {
            debug!(operation, error = %err, "order mutation rejected");
        }
    }
}
