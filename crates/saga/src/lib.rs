//! Saga orchestration for order fulfillment.
//!
//! An order moves through two forward steps, each with a compensating
//! action:
//! 1. Process payment (compensated by a refund)
//! 2. Reserve inventory (compensated by a release)
//!
//! A declined payment ends the order in `PAYMENT_FAILED`. A failed
//! reservation after a committed payment triggers a refund and ends the
//! order in `CANCELLED`. Each step runs under a deadline, and transient
//! transport failures are retried with bounded backoff.

pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod order_fulfillment;
pub mod progress;
pub mod retry;
pub mod services;

pub use error::{CapabilityError, SagaError};
pub use lock::{OrderLockGuard, OrderLocks};
pub use orchestrator::SagaOrchestrator;
pub use progress::{Compensation, SagaProgress};
pub use retry::{RetryPolicy, StepPolicy, retry_on_transient};
pub use services::{
    AlwaysApprove, AlwaysDecline, ApprovalRate, HttpInventoryClient, HttpPaymentClient,
    InMemoryInventoryService, InMemoryPaymentService, InventoryRequest, InventoryService,
    NewProduct, OutcomeProvider, PaymentRecord, PaymentService, PaymentStatus,
    ProcessPaymentRequest, Product, RefundPaymentRequest, Scripted,
};
