use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{CreateOrder, Money, Order, OrderStatus};

fn bench_create_order(c: &mut Criterion) {
    c.bench_function("domain/create_order", |b| {
        b.iter(|| {
            Order::create(black_box(CreateOrder::new(
                "customer-1",
                "PROD-001",
                2,
                Money::from_dollars(50),
            )))
            .unwrap()
        });
    });
}

fn bench_full_transition_path(c: &mut Criterion) {
    let path = [
        OrderStatus::PaymentProcessing,
        OrderStatus::PaymentCompleted,
        OrderStatus::InventoryProcessing,
        OrderStatus::InventoryCompleted,
        OrderStatus::Completed,
    ];

    c.bench_function("domain/happy_path_transitions", |b| {
        b.iter(|| {
            let mut status = OrderStatus::Pending;
            for next in path {
                status = status.transition(black_box(next)).unwrap();
            }
            status
        });
    });
}

fn bench_reject_illegal_transition(c: &mut Criterion) {
    c.bench_function("domain/reject_illegal_transition", |b| {
        b.iter(|| {
            OrderStatus::Pending
                .transition(black_box(OrderStatus::Completed))
                .is_err()
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_full_transition_path,
    bench_reject_illegal_transition
);
criterion_main!(benches);
