use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{
    AggregateRoot, CustomerId, DomainError, DomainResult, EnterpriseId, Entity, Money, OrderId,
    OrderItemId, ProductId,
};

use crate::status::OrderStatus;
use crate::validation::{ValidatedItem, ValidatedOrder, ValidatedPatch};

/// Input: one requested order line.
///
/// `product_name`, `unit_price` and `subtotal` are the caller's snapshot of
/// the catalog; the pipeline checks them against the current product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl NewOrderItem {
    /// Line with `subtotal` computed from `quantity × unit_price`.
    pub fn priced(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            subtotal: Money::from_cents(unit_price.cents().saturating_mul(i64::from(quantity))),
        }
    }
}

/// Input: create an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub order_date: NaiveDate,
    pub customer_id: CustomerId,
    pub enterprise_id: EnterpriseId,
    /// Computed from the items when absent.
    pub total_amount: Option<Money>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Input: partial update of an order. `None` leaves a field unchanged.
///
/// Supplying `items` replaces the whole item set (and rebalances stock).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub order_number: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
    pub enterprise_id: Option<EnterpriseId>,
    pub total_amount: Option<Money>,
    /// A blank string clears the notes.
    pub notes: Option<String>,
    pub items: Option<Vec<NewOrderItem>>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        self == &OrderPatch::default()
    }

    pub fn replaces_items(&self) -> bool {
        self.items.is_some()
    }
}

/// Aggregate root: Order.
///
/// Items are stored as separate records keyed by `order_id` and are owned by
/// the order (deleting the order deletes them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: String,
    order_date: NaiveDate,
    status: OrderStatus,
    customer_id: CustomerId,
    enterprise_id: EnterpriseId,
    total_amount: Money,
    notes: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Order {
    /// Build a new Pending order (version 1) and its items from validated input.
    pub fn create(validated: ValidatedOrder, now: DateTime<Utc>) -> (Order, Vec<OrderItem>) {
        let id = OrderId::new();
        let order = Order {
            id,
            order_number: validated.order_number,
            order_date: validated.order_date,
            status: OrderStatus::Pending,
            customer_id: validated.customer_id,
            enterprise_id: validated.enterprise_id,
            total_amount: validated.total_amount,
            notes: validated.notes,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let items = build_items(id, &validated.items, now);
        (order, items)
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn enterprise_id(&self) -> EnterpriseId {
        self.enterprise_id
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Structural mutations (update, item replacement) require a non-terminal order.
    pub fn ensure_mutable(&self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Completed => Err(DomainError::conflict(format!(
                "order {} is completed and cannot be changed",
                self.order_number
            ))),
            OrderStatus::Cancelled => Err(DomainError::conflict(format!(
                "order {} is cancelled and cannot be changed",
                self.order_number
            ))),
        }
    }

    /// Deletion is allowed for every status except Completed.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        if self.status == OrderStatus::Completed {
            return Err(DomainError::conflict(format!(
                "order {} is completed and cannot be deleted",
                self.order_number
            )));
        }
        Ok(())
    }

    /// Next version of this order with a validated patch applied.
    ///
    /// Items are not touched here; replacement items are built with
    /// [`Order::replacement_items`].
    pub fn apply_patch(&self, patch: &ValidatedPatch, now: DateTime<Utc>) -> Order {
        let mut next = self.next_version(now);
        if let Some(number) = &patch.order_number {
            next.order_number = number.clone();
        }
        if let Some(date) = patch.order_date {
            next.order_date = date;
        }
        if let Some(customer_id) = patch.customer_id {
            next.customer_id = customer_id;
        }
        if let Some(enterprise_id) = patch.enterprise_id {
            next.enterprise_id = enterprise_id;
        }
        if let Some(total) = patch.total_amount {
            next.total_amount = total;
        }
        if let Some(notes) = &patch.notes {
            next.notes = notes.clone();
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next
    }

    /// Next version of this order in `status`. The caller validates the transition.
    pub fn with_status(&self, status: OrderStatus, now: DateTime<Utc>) -> Order {
        let mut next = self.next_version(now);
        next.status = status;
        next
    }

    /// Fresh item records for a replacement item set.
    pub fn replacement_items(&self, items: &[ValidatedItem], now: DateTime<Utc>) -> Vec<OrderItem> {
        build_items(self.id, items, now)
    }

    fn next_version(&self, now: DateTime<Utc>) -> Order {
        Order {
            version: self.version + 1,
            updated_at: now,
            ..self.clone()
        }
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn build_items(order_id: OrderId, items: &[ValidatedItem], now: DateTime<Utc>) -> Vec<OrderItem> {
    items
        .iter()
        .map(|item| OrderItem {
            id: OrderItemId::new(),
            order_id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal,
            created_at: now,
        })
        .collect()
}
