use serde::{Deserialize, Serialize};

use orderdesk_core::Money;

/// Business limits applied by the validation pipeline.
///
/// The defaults are the production rules; deployments may tighten or loosen
/// them through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLimits {
    /// Smallest accepted order total.
    pub min_order_value: Money,
    /// Largest quantity on a single item.
    pub max_item_quantity: u32,
    /// Largest sum of quantities across an order's items.
    pub max_total_quantity: u32,
    pub max_order_number_len: usize,
    pub max_product_name_len: usize,
    pub max_notes_len: usize,
}

impl Default for OrderLimits {
    fn default() -> Self {
        Self {
            min_order_value: Money::from_major(5),
            max_item_quantity: 100,
            max_total_quantity: 50,
            max_order_number_len: 50,
            max_product_name_len: 255,
            max_notes_len: 1000,
        }
    }
}
