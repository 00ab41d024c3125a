use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use orderdesk_core::{CustomerId, EnterpriseId, Money, ProductId};
use orderdesk_events::{EventEnvelope, InMemoryEventBus};
use orderdesk_infra::store::{InMemoryRecordStore, RecordStore};
use orderdesk_infra::{OrderLifecycleManager, OrderPolicy, StockReservations};
use orderdesk_parties::{ContactInfo, Customer, Enterprise};
use orderdesk_products::{NewProduct, Product};
use orderdesk_sales::{NewOrder, NewOrderItem};

fn seed_products(
    store: &InMemoryRecordStore,
    enterprise_id: EnterpriseId,
    count: usize,
) -> Vec<Product> {
    (0..count)
        .map(|i| {
            let product = Product::new(
                NewProduct {
                    enterprise_id,
                    name: format!("Product {i}"),
                    description: String::new(),
                    price: Money::from_major(10),
                    stock: 999_999,
                },
                Utc::now(),
            )
            .unwrap();
            store.transaction(|tx| tx.insert_product(product.clone())).unwrap();
            product
        })
        .collect()
}

fn bench_reserve_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_release");
    group.throughput(Throughput::Elements(2));

    let store = InMemoryRecordStore::new();
    let product_id = seed_products(&store, EnterpriseId::new(), 1)[0].id_typed();
    let reservations = StockReservations::default();

    group.bench_function("single_product", |b| {
        b.iter(|| {
            reservations.reserve_stock(&store, black_box(product_id), 5).unwrap();
            reservations.release_stock(&store, black_box(product_id), 5).unwrap();
        });
    });

    group.finish();
}

fn bench_reserve_with_catalog_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_with_catalog_size");

    // Transactions copy the tables, so cost grows with the number of records.
    for catalog_size in [10usize, 100, 1000].iter() {
        let store = InMemoryRecordStore::new();
        let ids: Vec<ProductId> = seed_products(&store, EnterpriseId::new(), *catalog_size)
            .iter()
            .map(Product::id_typed)
            .collect();
        let reservations = StockReservations::default();

        group.bench_with_input(BenchmarkId::from_parameter(catalog_size), &ids, |b, ids| {
            let mut n = 0usize;
            b.iter(|| {
                let id = ids[n % ids.len()];
                n += 1;
                reservations.reserve_stock(&store, id, 1).unwrap();
                reservations.release_stock(&store, id, 1).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_order_create_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_create_delete");

    let store = Arc::new(InMemoryRecordStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>> =
        Arc::new(InMemoryEventBus::new());
    let customer = Customer::new("Bench", ContactInfo::default(), Utc::now()).unwrap();
    let enterprise =
        Enterprise::new("Bench Ltda", "Bench", ContactInfo::default(), Utc::now()).unwrap();
    let (customer_id, enterprise_id): (CustomerId, EnterpriseId) = (customer.id, enterprise.id);
    store
        .transaction(|tx| {
            tx.insert_customer(customer)?;
            tx.insert_enterprise(enterprise)
        })
        .unwrap();
    let products = seed_products(&store, enterprise_id, 5);
    let manager = OrderLifecycleManager::new(store.clone(), bus, OrderPolicy::default());
    let order_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    group.bench_function("five_items", |b| {
        b.iter(|| {
            let input = NewOrder {
                order_number: "BENCH-1".to_string(),
                order_date,
                customer_id,
                enterprise_id,
                total_amount: None,
                notes: None,
                items: products
                    .iter()
                    .map(|p| NewOrderItem::priced(p.id_typed(), p.name(), 2, p.price()))
                    .collect(),
            };
            let details = manager.create(black_box(input)).unwrap();
            manager.delete(details.order.id_typed()).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reserve_release,
    bench_reserve_with_catalog_size,
    bench_order_create_delete,
);
criterion_main!(benches);
