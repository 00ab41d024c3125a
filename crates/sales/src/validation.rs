//! Order validation pipeline.
//!
//! Every check here is a pure function of its inputs plus read-only lookups
//! through [`ReferenceLookup`]. Nothing is written. Checks stop at the first
//! failure and return the most specific error kind:
//!
//! | failure | error |
//! |---|---|
//! | missing customer / enterprise / product | `NotFound` |
//! | bad shape, mismatched snapshot or totals, caps, minimum value | `Validation` |
//! | order number already taken | `Conflict` |
//! | not enough stock | `Availability` |
//!
//! The stock check here is a pre-check only; the reservation itself re-checks
//! atomically inside the store transaction.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderdesk_core::{
    CustomerId, DomainError, DomainResult, EnterpriseId, Money, OrderId, ProductId,
};
use orderdesk_products::Product;

use crate::limits::OrderLimits;
use crate::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderPatch};
use crate::status::OrderStatus;

/// Read-only access to the records an order refers to.
pub trait ReferenceLookup {
    fn customer_exists(&self, id: CustomerId) -> bool;

    fn enterprise_exists(&self, id: EnterpriseId) -> bool;

    fn product(&self, id: ProductId) -> Option<Product>;

    /// The order currently holding `order_number`, if any.
    fn order_number_owner(&self, order_number: &str) -> Option<OrderId>;
}

/// An order line that passed every check, priced from its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    /// Always exactly `quantity × unit_price`.
    pub subtotal: Money,
}

/// A create request that passed the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedOrder {
    pub order_number: String,
    pub order_date: NaiveDate,
    pub customer_id: CustomerId,
    pub enterprise_id: EnterpriseId,
    /// Σ item subtotals.
    pub total_amount: Money,
    pub notes: Option<String>,
    pub items: Vec<ValidatedItem>,
}

/// The effective changes of an update request. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPatch {
    pub order_number: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
    pub enterprise_id: Option<EnterpriseId>,
    pub total_amount: Option<Money>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    pub items: Option<Vec<ValidatedItem>>,
}

impl ValidatedPatch {
    /// Names of the order fields this patch changes, for logging and events.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.order_number.is_some() {
            fields.push("order_number");
        }
        if self.order_date.is_some() {
            fields.push("order_date");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.customer_id.is_some() {
            fields.push("customer_id");
        }
        if self.enterprise_id.is_some() {
            fields.push("enterprise_id");
        }
        if self.total_amount.is_some() {
            fields.push("total_amount");
        }
        if self.notes.is_some() {
            fields.push("notes");
        }
        if self.items.is_some() {
            fields.push("items");
        }
        fields
    }
}

/// Runs the ordered checks for create and update requests.
#[derive(Debug, Clone)]
pub struct ValidationPipeline<'a> {
    limits: &'a OrderLimits,
    today: NaiveDate,
}

impl<'a> ValidationPipeline<'a> {
    pub fn new(limits: &'a OrderLimits, today: NaiveDate) -> Self {
        Self { limits, today }
    }

    pub fn limits(&self) -> &OrderLimits {
        self.limits
    }

    /// Validate a create request: referential, shape, consistency, business,
    /// uniqueness and availability checks, in that order.
    pub fn validate_create<L>(&self, input: &NewOrder, lookup: &L) -> DomainResult<ValidatedOrder>
    where
        L: ReferenceLookup + ?Sized,
    {
        ensure_customer(lookup, input.customer_id)?;
        ensure_enterprise(lookup, input.enterprise_id)?;

        let order_number = validate_order_number(&input.order_number, self.limits)?;
        validate_order_date(input.order_date, self.today)?;
        let notes = validate_notes(input.notes.as_deref(), self.limits)?;
        validate_item_shapes(&input.items, self.limits)?;

        let resolved = resolve_items(&input.items, input.enterprise_id, lookup)?;
        let items: Vec<ValidatedItem> = resolved.iter().map(|(item, _)| item.clone()).collect();

        let total_amount = reconcile_total(items.iter().map(|i| i.subtotal), input.total_amount)?;
        validate_min_order_value(total_amount, self.limits)?;

        if lookup.order_number_owner(&order_number).is_some() {
            return Err(duplicate_number(&order_number));
        }

        for (item, product) in &resolved {
            check_availability(item, product, 0)?;
        }

        Ok(ValidatedOrder {
            order_number,
            order_date: input.order_date,
            customer_id: input.customer_id,
            enterprise_id: input.enterprise_id,
            total_amount,
            notes,
            items,
        })
    }

    /// Validate an update request against the stored order and its items.
    ///
    /// Terminal orders are rejected before any field is looked at. A
    /// replacement item set is checked like a create, with availability
    /// counting the stock the current items will give back.
    pub fn validate_update<L>(
        &self,
        existing: &Order,
        existing_items: &[OrderItem],
        patch: &OrderPatch,
        lookup: &L,
    ) -> DomainResult<ValidatedPatch>
    where
        L: ReferenceLookup + ?Sized,
    {
        existing.ensure_mutable()?;

        let mut out = ValidatedPatch::default();
        if patch.is_empty() {
            return Ok(out);
        }

        if let Some(number) = &patch.order_number {
            let number = validate_order_number(number, self.limits)?;
            if number != existing.order_number() {
                match lookup.order_number_owner(&number) {
                    Some(owner) if owner != existing.id_typed() => {
                        return Err(duplicate_number(&number));
                    }
                    _ => out.order_number = Some(number),
                }
            }
        }

        if let Some(date) = patch.order_date {
            validate_order_date(date, self.today)?;
            if date != existing.order_date() {
                out.order_date = Some(date);
            }
        }

        let customer_id = patch.customer_id.filter(|c| *c != existing.customer_id());
        if let Some(customer_id) = customer_id {
            ensure_customer(lookup, customer_id)?;
            out.customer_id = Some(customer_id);
        }

        let enterprise_id = patch.enterprise_id.filter(|e| *e != existing.enterprise_id());
        if let Some(enterprise_id) = enterprise_id {
            ensure_enterprise(lookup, enterprise_id)?;
            out.enterprise_id = Some(enterprise_id);
        }

        if let Some(status) = patch.status.filter(|s| *s != existing.status()) {
            out.status = Some(existing.status().transition(status)?);
        }

        if let Some(notes) = &patch.notes {
            out.notes = Some(validate_notes(Some(notes.as_str()), self.limits)?);
        }

        let enterprise_id = out.enterprise_id.unwrap_or(existing.enterprise_id());

        match &patch.items {
            Some(items) => {
                validate_item_shapes(items, self.limits)?;
                let resolved = resolve_items(items, enterprise_id, lookup)?;
                let released = released_by_product(existing_items);
                for (item, product) in &resolved {
                    let back = released.get(&item.product_id).copied().unwrap_or(0);
                    check_availability(item, product, back)?;
                }
                out.items = Some(resolved.into_iter().map(|(item, _)| item).collect());
            }
            None if out.enterprise_id.is_some() => {
                for item in existing_items {
                    let product = lookup
                        .product(item.product_id)
                        .ok_or_else(|| product_not_found(item.product_id))?;
                    if !product.belongs_to(enterprise_id) {
                        return Err(DomainError::validation(format!(
                            "product {} on this order does not belong to enterprise {enterprise_id}; \
                             replace the items when moving the order",
                            product.name()
                        )));
                    }
                }
            }
            None => {}
        }

        if out.items.is_some() || patch.total_amount.is_some() {
            let total = match &out.items {
                Some(items) => {
                    reconcile_total(items.iter().map(|i| i.subtotal), patch.total_amount)?
                }
                None => {
                    let subtotals = existing_items.iter().map(|i| i.subtotal);
                    reconcile_total(subtotals, patch.total_amount)?
                }
            };
            validate_min_order_value(total, self.limits)?;
            if total != existing.total_amount() || out.items.is_some() {
                out.total_amount = Some(total);
            }
        }

        Ok(out)
    }
}

/// Non-empty, bounded length, ASCII letters, digits and hyphens only.
/// Returns the trimmed number.
pub fn validate_order_number(order_number: &str, limits: &OrderLimits) -> DomainResult<String> {
    let trimmed = order_number.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("order number is required"));
    }
    if trimmed.chars().count() > limits.max_order_number_len {
        return Err(DomainError::validation(format!(
            "order number cannot exceed {} characters",
            limits.max_order_number_len
        )));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(DomainError::validation(
            "order number may only contain letters, digits and hyphens",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_order_date(order_date: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    if order_date > today {
        return Err(DomainError::validation(format!(
            "order date {order_date} cannot be in the future"
        )));
    }
    Ok(())
}

/// Blank notes become `None`.
pub fn validate_notes(notes: Option<&str>, limits: &OrderLimits) -> DomainResult<Option<String>> {
    match notes {
        None => Ok(None),
        Some(n) if n.trim().is_empty() => Ok(None),
        Some(n) if n.chars().count() > limits.max_notes_len => Err(DomainError::validation(format!(
            "notes cannot exceed {} characters",
            limits.max_notes_len
        ))),
        Some(n) => Ok(Some(n.to_string())),
    }
}

/// Checks that need nothing but the request itself.
pub fn validate_item_shapes(items: &[NewOrderItem], limits: &OrderLimits) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("order must have at least one item"));
    }

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.product_id) {
            return Err(DomainError::validation(format!(
                "order cannot contain product {} more than once",
                item.product_id
            )));
        }
    }

    let total_quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();
    if total_quantity > u64::from(limits.max_total_quantity) {
        return Err(DomainError::validation(format!(
            "total item quantity cannot exceed {} (got {total_quantity})",
            limits.max_total_quantity
        )));
    }

    for (idx, item) in items.iter().enumerate() {
        validate_item_shape(idx, item, limits)?;
    }
    Ok(())
}

fn validate_item_shape(idx: usize, item: &NewOrderItem, limits: &OrderLimits) -> DomainResult<()> {
    let n = idx + 1;
    if item.quantity == 0 {
        return Err(DomainError::validation(format!(
            "item {n}: quantity must be greater than zero"
        )));
    }
    if item.quantity > limits.max_item_quantity {
        return Err(DomainError::validation(format!(
            "item {n}: quantity cannot exceed {} units",
            limits.max_item_quantity
        )));
    }
    if item.unit_price.is_negative() {
        return Err(DomainError::validation(format!("item {n}: unit price cannot be negative")));
    }
    if item.subtotal.is_negative() {
        return Err(DomainError::validation(format!("item {n}: subtotal cannot be negative")));
    }

    let expected = item.unit_price.times(item.quantity)?;
    if !item.subtotal.approx_eq(expected) {
        return Err(DomainError::validation(format!(
            "item {n}: incorrect subtotal, expected {expected}, got {}",
            item.subtotal
        )));
    }

    let name = item.product_name.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("item {n}: product name is required")));
    }
    if name.chars().count() > limits.max_product_name_len {
        return Err(DomainError::validation(format!(
            "item {n}: product name cannot exceed {} characters",
            limits.max_product_name_len
        )));
    }
    Ok(())
}

/// Compare one requested line with the current catalog record.
pub fn check_item_against_product(
    idx: usize,
    item: &NewOrderItem,
    product: &Product,
    enterprise_id: EnterpriseId,
) -> DomainResult<ValidatedItem> {
    let n = idx + 1;
    if !product.belongs_to(enterprise_id) {
        return Err(DomainError::validation(format!(
            "item {n}: product {} does not belong to enterprise {enterprise_id}",
            product.name()
        )));
    }
    if !product.price().approx_eq(item.unit_price) {
        return Err(DomainError::validation(format!(
            "item {n}: unit price for {} is {}, got {}",
            product.name(),
            product.price(),
            item.unit_price
        )));
    }
    let name = item.product_name.trim();
    if product.name() != name {
        return Err(DomainError::validation(format!(
            "item {n}: product name mismatch, expected '{}', got '{name}'",
            product.name()
        )));
    }

    Ok(ValidatedItem {
        product_id: item.product_id,
        product_name: name.to_string(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        subtotal: item.unit_price.times(item.quantity)?,
    })
}

/// Stock pre-check. `released` is stock the same request gives back first.
pub fn check_availability(
    item: &ValidatedItem,
    product: &Product,
    released: u32,
) -> DomainResult<()> {
    let available = product.stock().units().saturating_add(released);
    if available < item.quantity {
        return Err(DomainError::availability(
            product.id_typed(),
            product.name(),
            available,
            item.quantity,
        ));
    }
    Ok(())
}

/// Σ subtotals, checked against a supplied total (±0.01) when there is one.
pub fn reconcile_total<I>(subtotals: I, supplied: Option<Money>) -> DomainResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    let computed = Money::sum(subtotals)?;
    if let Some(supplied) = supplied {
        if supplied.is_negative() {
            return Err(DomainError::validation("total amount cannot be negative"));
        }
        if !supplied.approx_eq(computed) {
            return Err(DomainError::validation(format!(
                "incorrect order total, expected {computed}, got {supplied}"
            )));
        }
    }
    Ok(computed)
}

pub fn validate_min_order_value(total: Money, limits: &OrderLimits) -> DomainResult<()> {
    if total < limits.min_order_value {
        return Err(DomainError::validation(format!(
            "minimum order value is {}, order total is {total}",
            limits.min_order_value
        )));
    }
    Ok(())
}

fn resolve_items<L>(
    items: &[NewOrderItem],
    enterprise_id: EnterpriseId,
    lookup: &L,
) -> DomainResult<Vec<(ValidatedItem, Product)>>
where
    L: ReferenceLookup + ?Sized,
{
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let product = lookup
                .product(item.product_id)
                .ok_or_else(|| product_not_found(item.product_id))?;
            let validated = check_item_against_product(idx, item, &product, enterprise_id)?;
            Ok((validated, product))
        })
        .collect()
}

fn released_by_product(items: &[OrderItem]) -> HashMap<ProductId, u32> {
    let mut released = HashMap::new();
    for item in items {
        *released.entry(item.product_id).or_insert(0u32) += item.quantity;
    }
    released
}

fn ensure_customer<L>(lookup: &L, id: CustomerId) -> DomainResult<()>
where
    L: ReferenceLookup + ?Sized,
{
    if !lookup.customer_exists(id) {
        return Err(DomainError::not_found(format!("customer {id}")));
    }
    Ok(())
}

fn ensure_enterprise<L>(lookup: &L, id: EnterpriseId) -> DomainResult<()>
where
    L: ReferenceLookup + ?Sized,
{
    if !lookup.enterprise_exists(id) {
        return Err(DomainError::not_found(format!("enterprise {id}")));
    }
    Ok(())
}

fn product_not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("product {id}"))
}

fn duplicate_number(order_number: &str) -> DomainError {
    DomainError::conflict(format!("an order numbered {order_number} already exists"))
}
