//! Saga error types.

use std::time::Duration;

use common::{OrderId, ProductId};
use domain::{OrderError, OrderStatus};
use order_store::StoreError;
use thiserror::Error;

/// Errors returned by payment and inventory capabilities.
///
/// Every variant is a failed step outcome from the saga's point of view.
/// Only `Transport` and `Timeout` are eligible for retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The referenced order, product, payment or reservation does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The inventory cannot cover the requested quantity.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// The capability refused for business reasons.
    #[error("Declined: {0}")]
    Declined(String),

    /// The call could not complete (connection failure, server error).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call did not finish before its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl CapabilityError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CapabilityError::Transport(_) | CapabilityError::Timeout(_)
        )
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CapabilityError::NotFound { .. } => "not_found",
            CapabilityError::InsufficientStock { .. } => "insufficient_stock",
            CapabilityError::Declined(_) => "declined",
            CapabilityError::Transport(_) => "transport",
            CapabilityError::Timeout(_) => "timeout",
        }
    }
}

/// Errors that abort a saga run or reject it before it starts.
///
/// Business failures never appear here; they end in a terminal order status.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Order is not in `PENDING`, so the saga cannot start.
    #[error("Order {order_id} is in {status} state, expected PENDING")]
    OrderNotReady {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Another run holds the lock for this order.
    #[error("Saga already running for order {0}")]
    LockBusy(OrderId),

    /// The run attempted a move the state machine forbids.
    #[error("Illegal transition: {0}")]
    IllegalTransition(OrderError),

    /// The order was rejected at creation.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e @ OrderError::IllegalTransition { .. }) => {
                SagaError::IllegalTransition(e)
            }
            StoreError::Domain(e) => SagaError::InvalidOrder(e),
            other => SagaError::Store(other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_and_timeout_are_transient() {
        assert!(CapabilityError::Transport("reset".into()).is_transient());
        assert!(CapabilityError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(!CapabilityError::Declined("no".into()).is_transient());
        assert!(
            !CapabilityError::NotFound {
                resource: "product",
                id: "X".into()
            }
            .is_transient()
        );
        assert!(
            !CapabilityError::InsufficientStock {
                product_id: ProductId::new("P1"),
                available: 1,
                requested: 2
            }
            .is_transient()
        );
    }

    #[test]
    fn test_store_domain_errors_are_split() {
        let illegal: SagaError = StoreError::Domain(OrderError::IllegalTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Completed,
        })
        .into();
        assert!(matches!(illegal, SagaError::IllegalTransition(_)));

        let invalid: SagaError = StoreError::Domain(OrderError::ProductIdRequired).into();
        assert!(matches!(invalid, SagaError::InvalidOrder(_)));

        let missing: SagaError = StoreError::NotFound(OrderId::new()).into();
        assert!(matches!(missing, SagaError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_display_messages() {
        let err = CapabilityError::InsufficientStock {
            product_id: ProductId::new("P2"),
            available: 5,
            requested: 100,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P2: available 5, requested 100"
        );
        assert_eq!(err.kind(), "insufficient_stock");
    }
}
