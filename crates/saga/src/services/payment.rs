//! Payment capability trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::outcome::{AlwaysApprove, OutcomeProvider};
use crate::error::CapabilityError;

/// Charges and refunds customers.
///
/// Both operations are keyed by order ID and must be idempotent: repeating a
/// charge for the same order never charges twice, and repeating a refund
/// never refunds twice.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Charges the customer the given amount for an order.
    async fn process_payment(
        &self,
        order_id: OrderId,
        customer_id: &CustomerId,
        amount: Money,
    ) -> Result<(), CapabilityError>;

    /// Refunds the completed payment for an order.
    async fn refund_payment(&self, order_id: OrderId) -> Result<(), CapabilityError>;
}

#[async_trait]
impl<T: PaymentService + ?Sized> PaymentService for Arc<T> {
    async fn process_payment(
        &self,
        order_id: OrderId,
        customer_id: &CustomerId,
        amount: Money,
    ) -> Result<(), CapabilityError> {
        (**self)
            .process_payment(order_id, customer_id, amount)
            .await
    }

    async fn refund_payment(&self, order_id: OrderId) -> Result<(), CapabilityError> {
        (**self).refund_payment(order_id).await
    }
}

/// Status of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Failed,
    Refunded,
}

/// A payment attempt recorded by the in-memory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    payments: HashMap<OrderId, PaymentRecord>,
    next_id: u32,
    charge_calls: HashMap<OrderId, u32>,
    refund_calls: HashMap<OrderId, u32>,
    latency: Option<Duration>,
}

/// In-process payment service.
///
/// Keeps one payment record per order. Approval of new charges and refunds
/// is delegated to injectable [`OutcomeProvider`]s.
///
/// Nothing is ever evicted: payment records and the per-order call counters
/// behind [`charge_attempts`](Self::charge_attempts) and
/// [`refund_attempts`](Self::refund_attempts) grow with every order seen.
/// Counters saturate at `u32::MAX`.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
    charge_outcomes: Arc<dyn OutcomeProvider>,
    refund_outcomes: Arc<dyn OutcomeProvider>,
}

impl Default for InMemoryPaymentService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPaymentService {
    /// Creates a service that approves every charge and refund.
    pub fn new() -> Self {
        Self::with_outcomes(AlwaysApprove, AlwaysApprove)
    }

    /// Creates a service with the given charge and refund decisions.
    pub fn with_outcomes(
        charge_outcomes: impl OutcomeProvider + 'static,
        refund_outcomes: impl OutcomeProvider + 'static,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryPaymentState::default())),
            charge_outcomes: Arc::new(charge_outcomes),
            refund_outcomes: Arc::new(refund_outcomes),
        }
    }

    /// Delays every subsequent call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    /// Returns the payment record for an order, if any.
    pub async fn payment(&self, order_id: OrderId) -> Option<PaymentRecord> {
        self.state.read().await.payments.get(&order_id).cloned()
    }

    /// Returns all payment records, ordered by payment ID.
    pub async fn payments(&self) -> Vec<PaymentRecord> {
        let mut payments: Vec<_> = self.state.read().await.payments.values().cloned().collect();
        payments.sort_by(|a, b| a.payment_id.cmp(&b.payment_id));
        payments
    }

    /// Returns the number of recorded payments.
    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.len()
    }

    /// Number of `process_payment` calls received for an order.
    pub async fn charge_attempts(&self, order_id: OrderId) -> u32 {
        self.state
            .read()
            .await
            .charge_calls
            .get(&order_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of `refund_payment` calls received for an order.
    pub async fn refund_attempts(&self, order_id: OrderId) -> u32 {
        self.state
            .read()
            .await
            .refund_calls
            .get(&order_id)
            .copied()
            .unwrap_or(0)
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    #[tracing::instrument(skip(self, customer_id, amount), fields(amount_cents = amount.cents()))]
    async fn process_payment(
        &self,
        order_id: OrderId,
        customer_id: &CustomerId,
        amount: Money,
    ) -> Result<(), CapabilityError> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        let calls = state.charge_calls.entry(order_id).or_default();
        *calls = calls.saturating_add(1);

        if let Some(existing) = state.payments.get(&order_id) {
            tracing::warn!(payment_id = %existing.payment_id, "payment already exists for order");
            return match existing.status {
                PaymentStatus::Completed => Ok(()),
                PaymentStatus::Failed => Err(CapabilityError::Declined(format!(
                    "payment {} was declined",
                    existing.payment_id
                ))),
                PaymentStatus::Refunded => Err(CapabilityError::Declined(format!(
                    "payment {} was refunded",
                    existing.payment_id
                ))),
            };
        }

        let approved = self.charge_outcomes.approve();
        state.next_id += 1;
        let payment_id = format!("PAY-{:04}", state.next_id);
        let now = Utc::now();
        let status = if approved {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };

        state.payments.insert(
            order_id,
            PaymentRecord {
                payment_id: payment_id.clone(),
                order_id,
                customer_id: customer_id.clone(),
                amount,
                status,
                created_at: now,
                updated_at: now,
            },
        );

        if approved {
            metrics::counter!("payments_processed_total", "outcome" => "completed").increment(1);
            tracing::info!(%payment_id, "payment completed");
            Ok(())
        } else {
            metrics::counter!("payments_processed_total", "outcome" => "failed").increment(1);
            tracing::info!(%payment_id, "payment declined");
            Err(CapabilityError::Declined(format!(
                "payment {payment_id} declined by processor"
            )))
        }
    }

    #[tracing::instrument(skip(self))]
    async fn refund_payment(&self, order_id: OrderId) -> Result<(), CapabilityError> {
        self.simulate_latency().await;

        let mut state = self.state.write().await;
        let calls = state.refund_calls.entry(order_id).or_default();
        *calls = calls.saturating_add(1);

        let record = state
            .payments
            .get_mut(&order_id)
            .ok_or_else(|| CapabilityError::NotFound {
                resource: "payment",
                id: order_id.to_string(),
            })?;

        match record.status {
            PaymentStatus::Refunded => {
                tracing::warn!(payment_id = %record.payment_id, "payment already refunded");
                Ok(())
            }
            PaymentStatus::Failed => Err(CapabilityError::Declined(format!(
                "payment {} was not completed",
                record.payment_id
            ))),
            PaymentStatus::Completed => {
                if !self.refund_outcomes.approve() {
                    metrics::counter!("payments_refunded_total", "outcome" => "declined")
                        .increment(1);
                    return Err(CapabilityError::Declined(format!(
                        "refund for payment {} declined",
                        record.payment_id
                    )));
                }
                record.status = PaymentStatus::Refunded;
                record.updated_at = Utc::now();
                metrics::counter!("payments_refunded_total", "outcome" => "refunded").increment(1);
                tracing::info!(payment_id = %record.payment_id, "payment refunded");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::outcome::{AlwaysDecline, Scripted};

    fn customer() -> CustomerId {
        CustomerId::new("cust-1")
    }

    #[tokio::test]
    async fn test_charge_and_refund() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();

        service
            .process_payment(order_id, &customer(), Money::from_cents(5000))
            .await
            .unwrap();
        let record = service.payment(order_id).await.unwrap();
        assert_eq!(record.status, PaymentStatus::Completed);
        assert_eq!(record.amount.cents(), 5000);

        service.refund_payment(order_id).await.unwrap();
        let record = service.payment(order_id).await.unwrap();
        assert_eq!(record.status, PaymentStatus::Refunded);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn test_declined_charge_is_recorded_as_failed() {
        let service = InMemoryPaymentService::with_outcomes(AlwaysDecline, AlwaysApprove);
        let order_id = OrderId::new();

        let result = service
            .process_payment(order_id, &customer(), Money::from_cents(5000))
            .await;

        assert!(matches!(result, Err(CapabilityError::Declined(_))));
        assert_eq!(
            service.payment(order_id).await.unwrap().status,
            PaymentStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_repeat_charge_does_not_charge_twice() {
        let service = InMemoryPaymentService::with_outcomes(
            Scripted::new([true], false),
            AlwaysApprove,
        );
        let order_id = OrderId::new();

        service
            .process_payment(order_id, &customer(), Money::from_cents(100))
            .await
            .unwrap();
        // A second decision would decline; the recorded outcome wins.
        service
            .process_payment(order_id, &customer(), Money::from_cents(100))
            .await
            .unwrap();

        assert_eq!(service.payment_count().await, 1);
        assert_eq!(service.charge_attempts(order_id).await, 2);
    }

    #[tokio::test]
    async fn test_refund_is_idempotent() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();
        service
            .process_payment(order_id, &customer(), Money::from_cents(100))
            .await
            .unwrap();

        service.refund_payment(order_id).await.unwrap();
        service.refund_payment(order_id).await.unwrap();

        assert_eq!(
            service.payment(order_id).await.unwrap().status,
            PaymentStatus::Refunded
        );
        assert_eq!(service.refund_attempts(order_id).await, 2);
    }

    #[tokio::test]
    async fn test_refund_of_unknown_order_is_not_found() {
        let service = InMemoryPaymentService::new();
        let result = service.refund_payment(OrderId::new()).await;
        assert!(matches!(
            result,
            Err(CapabilityError::NotFound {
                resource: "payment",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_refund_of_failed_payment_is_declined() {
        let service = InMemoryPaymentService::with_outcomes(AlwaysDecline, AlwaysApprove);
        let order_id = OrderId::new();
        let _ = service
            .process_payment(order_id, &customer(), Money::from_cents(100))
            .await;

        let result = service.refund_payment(order_id).await;
        assert!(matches!(result, Err(CapabilityError::Declined(_))));
    }

    #[tokio::test]
    async fn test_declined_refund_keeps_payment_completed() {
        let service = InMemoryPaymentService::with_outcomes(AlwaysApprove, AlwaysDecline);
        let order_id = OrderId::new();
        service
            .process_payment(order_id, &customer(), Money::from_cents(100))
            .await
            .unwrap();

        let result = service.refund_payment(order_id).await;
        assert!(matches!(result, Err(CapabilityError::Declined(_))));
        assert_eq!(
            service.payment(order_id).await.unwrap().status,
            PaymentStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_sequential_payment_ids() {
        let service = InMemoryPaymentService::new();
        let first = OrderId::new();
        let second = OrderId::new();

        service
            .process_payment(first, &customer(), Money::from_cents(1000))
            .await
            .unwrap();
        service
            .process_payment(second, &customer(), Money::from_cents(1000))
            .await
            .unwrap();

        assert_eq!(service.payment(first).await.unwrap().payment_id, "PAY-0001");
        assert_eq!(service.payment(second).await.unwrap().payment_id, "PAY-0002");
    }

    #[tokio::test]
    async fn test_through_arc_dyn() {
        let service: Arc<dyn PaymentService> = Arc::new(InMemoryPaymentService::new());
        service
            .process_payment(OrderId::new(), &customer(), Money::from_cents(1))
            .await
            .unwrap();
    }
}
