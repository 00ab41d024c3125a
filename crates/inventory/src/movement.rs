use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{EnterpriseId, OrderId, ProductId};
use orderdesk_events::Event;

/// Which way stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Reserved,
    Released,
}

/// A committed change to one product's stock counter.
///
/// Produced by the reservation coordinator for every reserve/release, so an
/// order's reservations can be audited without a separate reservation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub product_id: ProductId,
    pub enterprise_id: EnterpriseId,
    pub direction: MovementDirection,
    pub quantity: u32,
    pub stock_before: u32,
    pub stock_after: u32,
}

impl StockMovement {
    /// Units actually added or removed (a capped release adds less than asked).
    pub fn applied(&self) -> u32 {
        self.stock_before.abs_diff(self.stock_after)
    }

    /// Attach the order that caused this movement and turn it into an event.
    pub fn into_event(
        self,
        order_id: Option<OrderId>,
        occurred_at: DateTime<Utc>,
    ) -> InventoryEvent {
        match self.direction {
            MovementDirection::Reserved => InventoryEvent::StockReserved(StockReserved {
                product_id: self.product_id,
                enterprise_id: self.enterprise_id,
                order_id,
                quantity: self.quantity,
                stock_after: self.stock_after,
                occurred_at,
            }),
            MovementDirection::Released => InventoryEvent::StockReleased(StockReleased {
                product_id: self.product_id,
                enterprise_id: self.enterprise_id,
                order_id,
                quantity: self.quantity,
                stock_after: self.stock_after,
                capped: self.applied() < self.quantity,
                occurred_at,
            }),
        }
    }
}

/// Event: StockReserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub product_id: ProductId,
    pub enterprise_id: EnterpriseId,
    pub order_id: Option<OrderId>,
    pub quantity: u32,
    pub stock_after: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockReleased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub product_id: ProductId,
    pub enterprise_id: EnterpriseId,
    pub order_id: Option<OrderId>,
    pub quantity: u32,
    pub stock_after: u32,
    /// The release hit the stock cap and added fewer units than `quantity`.
    pub capped: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    StockReserved(StockReserved),
    StockReleased(StockReleased),
}

impl InventoryEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            InventoryEvent::StockReserved(e) => e.product_id,
            InventoryEvent::StockReleased(e) => e.product_id,
        }
    }

    pub fn enterprise_id(&self) -> EnterpriseId {
        match self {
            InventoryEvent::StockReserved(e) => e.enterprise_id,
            InventoryEvent::StockReleased(e) => e.enterprise_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockReserved(_) => "inventory.stock.reserved",
            InventoryEvent::StockReleased(_) => "inventory.stock.released",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::StockReserved(e) => e.occurred_at,
            InventoryEvent::StockReleased(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(
        direction: MovementDirection,
        quantity: u32,
        before: u32,
        after: u32,
    ) -> StockMovement {
        StockMovement {
            product_id: ProductId::new(),
            enterprise_id: EnterpriseId::new(),
            direction,
            quantity,
            stock_before: before,
            stock_after: after,
        }
    }

    #[test]
    fn reservation_becomes_stock_reserved_event() {
        let order_id = OrderId::new();
        let ev = movement(MovementDirection::Reserved, 5, 100, 95)
            .into_event(Some(order_id), Utc::now());

        assert_eq!(ev.event_type(), "inventory.stock.reserved");
        match ev {
            InventoryEvent::StockReserved(e) => {
                assert_eq!(e.order_id, Some(order_id));
                assert_eq!(e.quantity, 5);
                assert_eq!(e.stock_after, 95);
            }
            _ => panic!("Expected StockReserved event"),
        }
    }

    #[test]
    fn capped_release_is_flagged() {
        let m = movement(MovementDirection::Released, 10, 999_995, 999_999);
        assert_eq!(m.applied(), 4);

        match m.into_event(None, Utc::now()) {
            InventoryEvent::StockReleased(e) => assert!(e.capped),
            _ => panic!("Expected StockReleased event"),
        }
    }
}
