//! Order status state machine.
//!
//! ```text
//! Pending ──▶ Completed
//!    │
//!    └──────▶ Cancelled
//! ```
//!
//! Both `Completed` and `Cancelled` are terminal: nothing leaves them, not even
//! a move to the other terminal state.

use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Completed, OrderStatus::Cancelled],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Validate `self → target` and return the new status.
    pub fn transition(self, target: OrderStatus) -> DomainResult<OrderStatus> {
        if !self.can_transition_to(target) {
            return Err(DomainError::validation(format!(
                "invalid status transition: from {self} to {target}"
            )));
        }
        Ok(target)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}' (expected pending, completed or cancelled)"
            ))),
        }
    }
}
