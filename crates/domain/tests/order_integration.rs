//! Integration tests for the Order entity.
//!
//! These tests walk orders along every saga path and verify that the
//! state machine is the only way the status can move.

use domain::{CreateOrder, Money, Order, OrderError, OrderStatus};

fn pending_order() -> Order {
    Order::create(CreateOrder::new(
        "customer-42",
        "PROD-001",
        2,
        Money::from_dollars(50),
    ))
    .unwrap()
}

fn walk(order: &mut Order, path: &[OrderStatus]) {
    for next in path {
        order.advance(*next).unwrap();
        order.touch();
    }
}

mod saga_paths {
    use super::*;

    #[test]
    fn happy_path_reaches_completed() {
        let mut order = pending_order();
        walk(
            &mut order,
            &[
                OrderStatus::PaymentProcessing,
                OrderStatus::PaymentCompleted,
                OrderStatus::InventoryProcessing,
                OrderStatus::InventoryCompleted,
                OrderStatus::Completed,
            ],
        );
        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(order.is_terminal());
    }

    #[test]
    fn payment_failure_path_is_terminal() {
        let mut order = pending_order();
        walk(
            &mut order,
            &[OrderStatus::PaymentProcessing, OrderStatus::PaymentFailed],
        );
        assert!(order.is_terminal());
        assert!(order.status().successors().is_empty());
    }

    #[test]
    fn inventory_failure_path_ends_cancelled() {
        let mut order = pending_order();
        walk(
            &mut order,
            &[
                OrderStatus::PaymentProcessing,
                OrderStatus::PaymentCompleted,
                OrderStatus::InventoryProcessing,
                OrderStatus::InventoryFailed,
                OrderStatus::Cancelled,
            ],
        );
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }
}

mod invariants {
    use super::*;

    #[test]
    fn steps_cannot_be_skipped() {
        let mut order = pending_order();
        let err = order.advance(OrderStatus::PaymentCompleted).unwrap_err();
        assert!(matches!(
            err,
            OrderError::IllegalTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::PaymentCompleted
            }
        ));
    }

    #[test]
    fn inventory_cannot_start_before_payment_completes() {
        let mut order = pending_order();
        order.advance(OrderStatus::PaymentProcessing).unwrap();
        assert!(order.advance(OrderStatus::InventoryProcessing).is_err());
    }

    #[test]
    fn payment_failure_cannot_be_cancelled() {
        let mut order = pending_order();
        walk(
            &mut order,
            &[OrderStatus::PaymentProcessing, OrderStatus::PaymentFailed],
        );
        assert!(order.advance(OrderStatus::Cancelled).is_err());
    }

    #[test]
    fn completed_order_never_regresses() {
        let mut order = pending_order();
        walk(
            &mut order,
            &[
                OrderStatus::PaymentProcessing,
                OrderStatus::PaymentCompleted,
                OrderStatus::InventoryProcessing,
                OrderStatus::InventoryCompleted,
                OrderStatus::Completed,
            ],
        );
        for status in OrderStatus::ALL {
            assert!(order.advance(status).is_err());
        }
        assert_eq!(order.status(), OrderStatus::Completed);
    }

    #[test]
    fn immutable_fields_survive_the_saga() {
        let mut order = pending_order();
        let before = order.clone();
        walk(
            &mut order,
            &[OrderStatus::PaymentProcessing, OrderStatus::PaymentCompleted],
        );
        assert_eq!(order.id(), before.id());
        assert_eq!(order.customer_id(), before.customer_id());
        assert_eq!(order.product_id(), before.product_id());
        assert_eq!(order.quantity(), before.quantity());
        assert_eq!(order.total_amount(), before.total_amount());
        assert_eq!(order.created_at(), before.created_at());
    }
}
