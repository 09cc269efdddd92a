//! Per-run record of the order statuses a saga has committed.

use domain::OrderStatus;

use crate::order_fulfillment;

/// A compensating action owed for a committed forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Refund the order's payment.
    RefundPayment,
    /// Return the order's reserved stock.
    ReleaseInventory,
}

impl Compensation {
    /// Returns the step name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Compensation::RefundPayment => order_fulfillment::COMPENSATE_REFUND_PAYMENT,
            Compensation::ReleaseInventory => order_fulfillment::COMPENSATE_RELEASE_INVENTORY,
        }
    }
}

/// Statuses a single run has durably written, in order.
///
/// Compensation is derived from this record alone: a refund is owed exactly
/// when the run committed `PAYMENT_COMPLETED`.
#[derive(Debug, Clone)]
pub struct SagaProgress {
    reached: Vec<OrderStatus>,
}

impl SagaProgress {
    /// Starts a record at the order's current status.
    pub fn new(start: OrderStatus) -> Self {
        Self {
            reached: vec![start],
        }
    }

    /// Records a status the run has just committed.
    pub fn record(&mut self, status: OrderStatus) {
        self.reached.push(status);
    }

    /// The most recently committed status.
    pub fn status(&self) -> OrderStatus {
        self.reached
            .last()
            .copied()
            .unwrap_or(OrderStatus::Pending)
    }

    pub fn has_reached(&self, status: OrderStatus) -> bool {
        self.reached.contains(&status)
    }

    /// All committed statuses, oldest first.
    pub fn reached(&self) -> &[OrderStatus] {
        &self.reached
    }

    /// Compensations owed, in reverse order of the steps they undo.
    pub fn compensations(&self) -> Vec<Compensation> {
        let mut owed = Vec::new();
        if self.has_reached(OrderStatus::InventoryCompleted) {
            owed.push(Compensation::ReleaseInventory);
        }
        if self.has_reached(OrderStatus::PaymentCompleted) {
            owed.push(Compensation::RefundPayment);
        }
        owed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_owed_before_payment_commits() {
        let mut progress = SagaProgress::new(OrderStatus::Pending);
        progress.record(OrderStatus::PaymentProcessing);
        progress.record(OrderStatus::PaymentFailed);

        assert_eq!(progress.status(), OrderStatus::PaymentFailed);
        assert!(progress.compensations().is_empty());
    }

    #[test]
    fn test_refund_owed_after_payment_commits() {
        let mut progress = SagaProgress::new(OrderStatus::Pending);
        for status in [
            OrderStatus::PaymentProcessing,
            OrderStatus::PaymentCompleted,
            OrderStatus::InventoryProcessing,
            OrderStatus::InventoryFailed,
        ] {
            progress.record(status);
        }

        assert_eq!(progress.compensations(), vec![Compensation::RefundPayment]);
        assert_eq!(progress.reached().len(), 5);
    }

    #[test]
    fn test_compensations_run_in_reverse() {
        let mut progress = SagaProgress::new(OrderStatus::Pending);
        for status in [
            OrderStatus::PaymentProcessing,
            OrderStatus::PaymentCompleted,
            OrderStatus::InventoryProcessing,
            OrderStatus::InventoryCompleted,
        ] {
            progress.record(status);
        }

        assert_eq!(
            progress.compensations(),
            vec![Compensation::ReleaseInventory, Compensation::RefundPayment]
        );
        assert_eq!(Compensation::RefundPayment.name(), "refund_payment");
    }
}
