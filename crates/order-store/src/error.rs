use domain::{OrderError, OrderStatus};
use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order is stored under this ID.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this ID was already inserted.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// A compare-and-set saw a different status than the writer expected.
    #[error("Status conflict for order {order_id}: expected {expected}, found {actual}")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The requested write was rejected by the order itself.
    #[error("Domain error: {0}")]
    Domain(#[from] OrderError),

    /// A stored row could not be mapped back to an order.
    #[error("Corrupt order row {order_id}: {reason}")]
    Corrupt { order_id: String, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
