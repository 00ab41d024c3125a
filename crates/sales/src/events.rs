use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{CustomerId, EnterpriseId, Money, OrderId};
use orderdesk_events::Event;

use crate::order::{Order, OrderItem};
use crate::status::OrderStatus;

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub enterprise_id: EnterpriseId,
    pub customer_id: CustomerId,
    pub order_number: String,
    pub total_amount: Money,
    pub item_count: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderUpdated (header fields only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdated {
    pub order_id: OrderId,
    pub enterprise_id: EnterpriseId,
    pub changed_fields: Vec<String>,
    pub version: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderItemsReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemsReplaced {
    pub order_id: OrderId,
    pub enterprise_id: EnterpriseId,
    pub item_count: usize,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub enterprise_id: EnterpriseId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeleted {
    pub order_id: OrderId,
    pub enterprise_id: EnterpriseId,
    pub order_number: String,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated(OrderCreated),
    OrderUpdated(OrderUpdated),
    OrderItemsReplaced(OrderItemsReplaced),
    OrderStatusChanged(OrderStatusChanged),
    OrderDeleted(OrderDeleted),
}

impl OrderEvent {
    pub fn created(order: &Order, items: &[OrderItem], occurred_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderCreated(OrderCreated {
            order_id: order.id_typed(),
            enterprise_id: order.enterprise_id(),
            customer_id: order.customer_id(),
            order_number: order.order_number().to_string(),
            total_amount: order.total_amount(),
            item_count: items.len(),
            occurred_at,
        })
    }

    pub fn status_changed(order: &Order, from: OrderStatus, occurred_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderStatusChanged(OrderStatusChanged {
            order_id: order.id_typed(),
            enterprise_id: order.enterprise_id(),
            from,
            to: order.status(),
            occurred_at,
        })
    }

    pub fn deleted(order: &Order, occurred_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderDeleted(OrderDeleted {
            order_id: order.id_typed(),
            enterprise_id: order.enterprise_id(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            occurred_at,
        })
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated(e) => e.order_id,
            OrderEvent::OrderUpdated(e) => e.order_id,
            OrderEvent::OrderItemsReplaced(e) => e.order_id,
            OrderEvent::OrderStatusChanged(e) => e.order_id,
            OrderEvent::OrderDeleted(e) => e.order_id,
        }
    }

    pub fn enterprise_id(&self) -> EnterpriseId {
        match self {
            OrderEvent::OrderCreated(e) => e.enterprise_id,
            OrderEvent::OrderUpdated(e) => e.enterprise_id,
            OrderEvent::OrderItemsReplaced(e) => e.enterprise_id,
            OrderEvent::OrderStatusChanged(e) => e.enterprise_id,
            OrderEvent::OrderDeleted(e) => e.enterprise_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "sales.order.created",
            OrderEvent::OrderUpdated(_) => "sales.order.updated",
            OrderEvent::OrderItemsReplaced(_) => "sales.order.items_replaced",
            OrderEvent::OrderStatusChanged(_) => "sales.order.status_changed",
            OrderEvent::OrderDeleted(_) => "sales.order.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated(e) => e.occurred_at,
            OrderEvent::OrderUpdated(e) => e.occurred_at,
            OrderEvent::OrderItemsReplaced(e) => e.occurred_at,
            OrderEvent::OrderStatusChanged(e) => e.occurred_at,
            OrderEvent::OrderDeleted(e) => e.occurred_at,
        }
    }
}
