//! Payment and inventory capabilities used by saga steps.
//!
//! Each capability has an in-process implementation for tests and the demo
//! server, and an HTTP client for remote deployments.

pub mod http;
pub mod inventory;
pub mod outcome;
pub mod payment;

pub use http::{
    HttpInventoryClient, HttpPaymentClient, InventoryRequest, ProcessPaymentRequest,
    RefundPaymentRequest,
};
pub use inventory::{InMemoryInventoryService, InventoryService, NewProduct, Product};
pub use outcome::{AlwaysApprove, AlwaysDecline, ApprovalRate, OutcomeProvider, Scripted};
pub use payment::{InMemoryPaymentService, PaymentRecord, PaymentService, PaymentStatus};
