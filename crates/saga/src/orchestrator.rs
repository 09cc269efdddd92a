//! Saga orchestrator driving an order through payment and inventory.

use std::sync::Arc;
use std::time::Instant;

use common::OrderId;
use domain::{CreateOrder, Order, OrderStatus};
use order_store::OrderStore;
use tokio::task::JoinHandle;

use crate::error::{CapabilityError, SagaError};
use crate::lock::OrderLocks;
use crate::order_fulfillment;
use crate::progress::{Compensation, SagaProgress};
use crate::retry::StepPolicy;
use crate::services::inventory::InventoryService;
use crate::services::payment::PaymentService;

/// Orchestrates the order fulfillment saga.
///
/// The saga charges the customer, then reserves stock. If the reservation
/// fails after the charge committed, the payment is refunded and the order
/// ends `CANCELLED`. Every status change is validated by the order state
/// machine and written with a compare-and-set against the status this run
/// last committed.
pub struct SagaOrchestrator<S, P, I>
where
    S: OrderStore,
    P: PaymentService,
    I: InventoryService,
{
    store: S,
    payment: P,
    inventory: I,
    policy: StepPolicy,
    locks: OrderLocks,
}

impl<S, P, I> SagaOrchestrator<S, P, I>
where
    S: OrderStore,
    P: PaymentService,
    I: InventoryService,
{
    /// Creates an orchestrator with the default step policy.
    pub fn new(store: S, payment: P, inventory: I) -> Self {
        Self {
            store,
            payment,
            inventory,
            policy: StepPolicy::default(),
            locks: OrderLocks::new(),
        }
    }

    /// Replaces the deadline and retry policy applied to every step.
    pub fn with_policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &StepPolicy {
        &self.policy
    }

    pub fn locks(&self) -> &OrderLocks {
        &self.locks
    }

    /// Runs the saga for a `PENDING` order and returns its terminal status.
    ///
    /// Business failures (declined payment, insufficient stock, deadline
    /// expiry) end in `PAYMENT_FAILED` or `CANCELLED` and are not errors.
    /// Errors mean the run was rejected or aborted: another run holds the
    /// order, the order is missing or not pending, or a store write failed.
    #[tracing::instrument(skip(self), fields(saga_type = order_fulfillment::SAGA_TYPE))]
    pub async fn run(&self, order_id: OrderId) -> Result<OrderStatus, SagaError> {
        let _guard = self.locks.try_acquire(order_id)?;

        let order = self
            .store
            .get(order_id)
            .await?
            .ok_or(SagaError::OrderNotFound(order_id))?;

        if order.status() != OrderStatus::Pending {
            return Err(SagaError::OrderNotReady {
                order_id,
                status: order.status(),
            });
        }

        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let result = self.execute(&order).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);

        match &result {
            Ok(OrderStatus::Completed) => {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(%order_id, duration, "saga completed successfully");
            }
            Ok(OrderStatus::PaymentFailed) => {
                metrics::counter!("saga_payment_failed").increment(1);
                tracing::warn!(%order_id, duration, "saga ended with failed payment");
            }
            Ok(OrderStatus::Cancelled) => {
                metrics::counter!("saga_cancelled").increment(1);
                tracing::warn!(%order_id, duration, "saga cancelled after compensation");
            }
            Ok(status) => {
                tracing::warn!(%order_id, %status, "saga returned a non-terminal status");
            }
            Err(error) => {
                metrics::counter!("saga_aborted_total").increment(1);
                tracing::error!(%order_id, %error, "saga aborted");
            }
        }

        result
    }

    async fn execute(&self, order: &Order) -> Result<OrderStatus, SagaError> {
        let order_id = order.id();
        let mut progress = SagaProgress::new(order.status());

        // Step 1: process payment
        tracing::info!(step = order_fulfillment::STEP_PROCESS_PAYMENT, "saga step started");
        self.advance(&mut progress, order_id, OrderStatus::PaymentProcessing)
            .await?;

        let charge = self
            .policy
            .call(order_fulfillment::STEP_PROCESS_PAYMENT, || {
                self.payment
                    .process_payment(order_id, order.customer_id(), order.total_amount())
            })
            .await;

        if let Err(error) = charge {
            Self::record_step_failure(order_fulfillment::STEP_PROCESS_PAYMENT, order_id, &error);
            self.advance(&mut progress, order_id, OrderStatus::PaymentFailed)
                .await?;
            return Ok(progress.status());
        }
        self.advance(&mut progress, order_id, OrderStatus::PaymentCompleted)
            .await?;

        // Step 2: reserve inventory
        tracing::info!(step = order_fulfillment::STEP_RESERVE_INVENTORY, "saga step started");
        self.advance(&mut progress, order_id, OrderStatus::InventoryProcessing)
            .await?;

        let reservation = self
            .policy
            .call(order_fulfillment::STEP_RESERVE_INVENTORY, || {
                self.inventory
                    .reserve(order_id, order.product_id(), order.quantity())
            })
            .await;

        match reservation {
            Ok(()) => {
                self.advance(&mut progress, order_id, OrderStatus::InventoryCompleted)
                    .await?;
                self.advance(&mut progress, order_id, OrderStatus::Completed)
                    .await?;
            }
            Err(error) => {
                Self::record_step_failure(
                    order_fulfillment::STEP_RESERVE_INVENTORY,
                    order_id,
                    &error,
                );
                self.advance(&mut progress, order_id, OrderStatus::InventoryFailed)
                    .await?;
                self.compensate(order, &progress).await;
                self.advance(&mut progress, order_id, OrderStatus::Cancelled)
                    .await?;
            }
        }

        Ok(progress.status())
    }

    /// Checks the edge against the state machine, then commits it.
    async fn advance(
        &self,
        progress: &mut SagaProgress,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<(), SagaError> {
        let current = progress.status();
        current
            .transition(next)
            .map_err(SagaError::IllegalTransition)?;

        self.store
            .compare_and_set_status(order_id, current, next)
            .await?;
        progress.record(next);

        tracing::debug!(%order_id, from = %current, to = %next, "order status advanced");
        Ok(())
    }

    /// Runs owed compensations. Failures are logged and counted, never raised.
    #[tracing::instrument(skip(self, order, progress), fields(order_id = %order.id()))]
    async fn compensate(&self, order: &Order, progress: &SagaProgress) {
        let order_id = order.id();

        for compensation in progress.compensations() {
            let name = compensation.name();
            let result = match compensation {
                Compensation::RefundPayment => {
                    self.policy
                        .call(name, || self.payment.refund_payment(order_id))
                        .await
                }
                Compensation::ReleaseInventory => {
                    self.policy
                        .call(name, || {
                            self.inventory
                                .release(order_id, order.product_id(), order.quantity())
                        })
                        .await
                }
            };

            match result {
                Ok(()) => tracing::info!(compensation = name, "compensation step completed"),
                Err(error) => {
                    metrics::counter!("saga_compensation_failures_total", "compensation" => name)
                        .increment(1);
                    tracing::error!(
                        compensation = name,
                        %error,
                        "compensation step failed, order will still be cancelled"
                    );
                }
            }
        }
    }

    fn record_step_failure(step: &'static str, order_id: OrderId, error: &CapabilityError) {
        metrics::counter!("saga_step_failures_total", "step" => step, "reason" => error.kind())
            .increment(1);
        tracing::warn!(step, %order_id, %error, "saga step failed");
    }
}

impl<S, P, I> SagaOrchestrator<S, P, I>
where
    S: OrderStore + 'static,
    P: PaymentService + 'static,
    I: InventoryService + 'static,
{
    /// Validates and stores a new order, then starts its saga in the background.
    ///
    /// Returns the stored `PENDING` order as soon as it is persisted, along
    /// with a handle resolving to the saga outcome.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(
        self: Arc<Self>,
        cmd: CreateOrder,
    ) -> Result<(Order, JoinHandle<Result<OrderStatus, SagaError>>), SagaError> {
        let order = Order::create(cmd)?;
        let order = self.store.insert(order).await?;
        let order_id = order.id();

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(%order_id, "order placed");

        let handle = tokio::spawn(async move { self.run(order_id).await });

        Ok((order, handle))
    }
}
