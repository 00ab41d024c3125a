use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use orderdesk_core::{
    AggregateRoot, CustomerId, EnterpriseId, ExpectedVersion, OrderId, ProductId,
};
use orderdesk_parties::{Customer, Enterprise};
use orderdesk_products::Product;
use orderdesk_sales::{Order, OrderItem};

use super::r#trait::{RecordStore, StoreError, StoreTx, StoreView};

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    enterprises: BTreeMap<EnterpriseId, Enterprise>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderId, Vec<OrderItem>>,

    // Unique indexes.
    order_numbers: HashMap<String, OrderId>,
    product_names: HashSet<(EnterpriseId, String)>,
}

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance: a transaction works
/// on a full copy of the tables, taken under the write lock, and swaps it in
/// only when the closure returns `Ok`.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn StoreView) -> T,
    {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let view: &dyn StoreView = &*tables;
        Ok(f(view))
    }

    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let mut working = tables.clone();
        let out = f(&mut working as &mut dyn StoreTx)?;
        *tables = working;
        Ok(out)
    }
}

impl StoreView for Tables {
    fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers.get(&id).cloned()
    }

    fn enterprise(&self, id: EnterpriseId) -> Option<Enterprise> {
        self.enterprises.get(&id).cloned()
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).cloned()
    }

    fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).cloned()
    }

    fn order_by_number(&self, order_number: &str) -> Option<Order> {
        self.order_numbers
            .get(order_number)
            .and_then(|id| self.orders.get(id))
            .cloned()
    }

    fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.values().cloned().collect();
        orders.sort_by_key(|o| (o.created_at(), o.id_typed()));
        orders
    }

    fn items_for_order(&self, order_id: OrderId) -> Vec<OrderItem> {
        self.items.get(&order_id).cloned().unwrap_or_default()
    }
}

impl StoreTx for Tables {
    fn insert_customer(&mut self, customer: Customer) -> Result<(), StoreError> {
        if self.customers.contains_key(&customer.id) {
            return Err(StoreError::UniqueViolation(format!(
                "customer {} already exists",
                customer.id
            )));
        }
        self.customers.insert(customer.id, customer);
        Ok(())
    }

    fn insert_enterprise(&mut self, enterprise: Enterprise) -> Result<(), StoreError> {
        if self.enterprises.contains_key(&enterprise.id) {
            return Err(StoreError::UniqueViolation(format!(
                "enterprise {} already exists",
                enterprise.id
            )));
        }
        self.enterprises.insert(enterprise.id, enterprise);
        Ok(())
    }

    fn insert_product(&mut self, product: Product) -> Result<(), StoreError> {
        let name_key = (product.enterprise_id(), product.name().to_string());
        if self.product_names.contains(&name_key) {
            return Err(StoreError::UniqueViolation(format!(
                "a product named {} already exists in enterprise {}",
                product.name(),
                product.enterprise_id()
            )));
        }
        if self.products.contains_key(&product.id_typed()) {
            return Err(StoreError::UniqueViolation(format!(
                "product {} already exists",
                product.id_typed()
            )));
        }
        self.product_names.insert(name_key);
        self.products.insert(product.id_typed(), product);
        Ok(())
    }

    fn save_product(
        &mut self,
        product: Product,
        expected: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let id = product.id_typed();
        let stored = self
            .products
            .get(&id)
            .ok_or_else(|| StoreError::MissingRecord(format!("product {id}")))?;
        if !expected.matches(stored.version()) {
            return Err(StoreError::VersionMismatch {
                record: format!("product {id}"),
                expected,
                actual: stored.version(),
            });
        }
        self.products.insert(id, product);
        Ok(())
    }

    fn insert_order(&mut self, order: Order) -> Result<(), StoreError> {
        if self.order_numbers.contains_key(order.order_number()) {
            return Err(StoreError::UniqueViolation(format!(
                "an order numbered {} already exists",
                order.order_number()
            )));
        }
        if self.orders.contains_key(&order.id_typed()) {
            return Err(StoreError::UniqueViolation(format!(
                "order {} already exists",
                order.id_typed()
            )));
        }
        self.order_numbers
            .insert(order.order_number().to_string(), order.id_typed());
        self.orders.insert(order.id_typed(), order);
        Ok(())
    }

    fn save_order(&mut self, order: Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        let id = order.id_typed();
        let stored = self
            .orders
            .get(&id)
            .ok_or_else(|| StoreError::MissingRecord(format!("order {id}")))?;
        if !expected.matches(stored.version()) {
            return Err(StoreError::VersionMismatch {
                record: format!("order {id}"),
                expected,
                actual: stored.version(),
            });
        }

        if stored.order_number() != order.order_number() {
            match self.order_numbers.get(order.order_number()) {
                Some(owner) if *owner != id => {
                    return Err(StoreError::UniqueViolation(format!(
                        "an order numbered {} already exists",
                        order.order_number()
                    )));
                }
                _ => {}
            }
            let previous = stored.order_number().to_string();
            self.order_numbers.remove(&previous);
            self.order_numbers.insert(order.order_number().to_string(), id);
        }

        self.orders.insert(id, order);
        Ok(())
    }

    fn delete_order(&mut self, id: OrderId) -> Result<Order, StoreError> {
        let order = self
            .orders
            .remove(&id)
            .ok_or_else(|| StoreError::MissingRecord(format!("order {id}")))?;
        self.order_numbers.remove(order.order_number());
        self.items.remove(&id);
        Ok(order)
    }

    fn insert_items(&mut self, items: Vec<OrderItem>) -> Result<(), StoreError> {
        for item in items {
            if !self.orders.contains_key(&item.order_id) {
                return Err(StoreError::MissingRecord(format!("order {}", item.order_id)));
            }
            self.items.entry(item.order_id).or_default().push(item);
        }
        Ok(())
    }

    fn delete_items(&mut self, order_id: OrderId) -> Vec<OrderItem> {
        self.items.remove(&order_id).unwrap_or_default()
    }
}
