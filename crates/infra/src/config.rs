//! Configuration loading and representation.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use orderdesk_core::Money;
use orderdesk_sales::OrderLimits;

pub const MIN_ORDER_VALUE_ENV: &str = "ORDERDESK_MIN_ORDER_VALUE";
pub const MAX_ITEM_QUANTITY_ENV: &str = "ORDERDESK_MAX_ITEM_QUANTITY";
pub const MAX_TOTAL_QUANTITY_ENV: &str = "ORDERDESK_MAX_TOTAL_QUANTITY";

/// Business limits for order validation, as deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPolicy {
    pub min_order_value: Money,
    pub max_item_quantity: u32,
    pub max_total_quantity: u32,
    pub max_order_number_len: usize,
    pub max_product_name_len: usize,
    pub max_notes_len: usize,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        OrderLimits::default().into()
    }
}

impl OrderPolicy {
    /// Defaults overridden by `ORDERDESK_*` environment variables.
    ///
    /// An unparsable value is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`OrderPolicy::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();
        if let Some(v) = parse_var(&lookup, MIN_ORDER_VALUE_ENV) {
            policy.min_order_value = v;
        }
        if let Some(v) = parse_var(&lookup, MAX_ITEM_QUANTITY_ENV) {
            policy.max_item_quantity = v;
        }
        if let Some(v) = parse_var(&lookup, MAX_TOTAL_QUANTITY_ENV) {
            policy.max_total_quantity = v;
        }
        policy
    }

    pub fn limits(&self) -> OrderLimits {
        self.clone().into()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: core::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(variable = key, value = %raw, error = %e, "ignoring invalid configuration value");
            None
        }
    }
}

impl From<OrderPolicy> for OrderLimits {
    fn from(p: OrderPolicy) -> Self {
        OrderLimits {
            min_order_value: p.min_order_value,
            max_item_quantity: p.max_item_quantity,
            max_total_quantity: p.max_total_quantity,
            max_order_number_len: p.max_order_number_len,
            max_product_name_len: p.max_product_name_len,
            max_notes_len: p.max_notes_len,
        }
    }
}

impl From<OrderLimits> for OrderPolicy {
    fn from(l: OrderLimits) -> Self {
        OrderPolicy {
            min_order_value: l.min_order_value,
            max_item_quantity: l.max_item_quantity,
            max_total_quantity: l.max_total_quantity,
            max_order_number_len: l.max_order_number_len,
            max_product_name_len: l.max_product_name_len,
            max_notes_len: l.max_notes_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_the_production_rules() {
        let p = OrderPolicy::default();
        assert_eq!(p.min_order_value, Money::from_major(5));
        assert_eq!(p.max_item_quantity, 100);
        assert_eq!(p.max_total_quantity, 50);
        assert_eq!(p.limits(), OrderLimits::default());
    }

    #[test]
    fn variables_override_defaults() {
        let p = OrderPolicy::from_lookup(lookup(&[
            (MIN_ORDER_VALUE_ENV, "12.50"),
            (MAX_TOTAL_QUANTITY_ENV, " 80 "),
        ]));
        assert_eq!(p.min_order_value, Money::from_cents(1250));
        assert_eq!(p.max_total_quantity, 80);
        assert_eq!(p.max_item_quantity, 100);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let p = OrderPolicy::from_lookup(lookup(&[
            (MIN_ORDER_VALUE_ENV, "5.001"),
            (MAX_ITEM_QUANTITY_ENV, "lots"),
        ]));
        assert_eq!(p, OrderPolicy::default());
    }
}
