use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CreateOrder, Money, Order, ProductId};
use order_store::{InMemoryOrderStore, OrderStore};
use saga::{InMemoryInventoryService, InMemoryPaymentService, NewProduct, SagaOrchestrator};

fn catalog() -> NewProduct {
    NewProduct {
        id: ProductId::new("PROD-001"),
        name: "Smartphone".to_string(),
        description: String::new(),
        price: Money::from_cents(69_999),
        stock: u32::MAX,
    }
}

fn bench_happy_path(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = rt.block_on(async {
        SagaOrchestrator::new(
            InMemoryOrderStore::new(),
            InMemoryPaymentService::new(),
            InMemoryInventoryService::with_products([catalog()]).await,
        )
    });

    c.bench_function("saga/run_to_completed", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = Order::create(CreateOrder::new(
                    "customer-1",
                    "PROD-001",
                    1,
                    Money::from_dollars(700),
                ))
                .unwrap();
                let order = orchestrator.store().insert(order).await.unwrap();
                orchestrator.run(order.id()).await.unwrap();
            });
        });
    });
}

fn bench_cancel_with_refund(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orchestrator = SagaOrchestrator::new(
        InMemoryOrderStore::new(),
        InMemoryPaymentService::new(),
        InMemoryInventoryService::new(),
    );

    c.bench_function("saga/run_to_cancelled", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = Order::create(CreateOrder::new(
                    "customer-1",
                    "PROD-404",
                    1,
                    Money::from_dollars(10),
                ))
                .unwrap();
                let order = orchestrator.store().insert(order).await.unwrap();
                orchestrator.run(order.id()).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_happy_path, bench_cancel_with_refund);
criterion_main!(benches);
