//! Per-order run locks.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use common::OrderId;

use crate::error::SagaError;

/// Registry of orders with an active saga run.
///
/// Acquisition never waits: a second caller for the same order gets
/// `SagaError::LockBusy`. Different orders never contend.
#[derive(Debug, Clone, Default)]
pub struct OrderLocks {
    in_flight: Arc<Mutex<HashSet<OrderId>>>,
}

impl OrderLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the order for the caller until the guard is dropped.
    pub fn try_acquire(&self, order_id: OrderId) -> Result<OrderLockGuard, SagaError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(order_id) {
            return Err(SagaError::LockBusy(order_id));
        }

        Ok(OrderLockGuard {
            in_flight: Arc::clone(&self.in_flight),
            order_id,
        })
    }

    /// Returns true if a run currently holds the order.
    pub fn is_locked(&self, order_id: OrderId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&order_id)
    }

    /// Returns the number of orders currently held.
    pub fn held(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Releases the order's lock on drop.
#[derive(Debug)]
pub struct OrderLockGuard {
    in_flight: Arc<Mutex<HashSet<OrderId>>>,
    order_id: OrderId,
}

impl OrderLockGuard {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let locks = OrderLocks::new();
        let order_id = OrderId::new();

        let guard = locks.try_acquire(order_id).unwrap();
        assert_eq!(guard.order_id(), order_id);
        assert!(locks.is_locked(order_id));

        let second = locks.try_acquire(order_id);
        assert!(matches!(second, Err(SagaError::LockBusy(id)) if id == order_id));
    }

    #[test]
    fn test_drop_releases() {
        let locks = OrderLocks::new();
        let order_id = OrderId::new();

        drop(locks.try_acquire(order_id).unwrap());

        assert!(!locks.is_locked(order_id));
        assert!(locks.try_acquire(order_id).is_ok());
    }

    #[test]
    fn test_orders_do_not_contend() {
        let locks = OrderLocks::new();
        let _a = locks.try_acquire(OrderId::new()).unwrap();
        let _b = locks.try_acquire(OrderId::new()).unwrap();
        assert_eq!(locks.held(), 2);
    }

    #[test]
    fn test_clones_share_registry() {
        let locks = OrderLocks::new();
        let order_id = OrderId::new();
        let _guard = locks.try_acquire(order_id).unwrap();

        let other = locks.clone();
        assert!(other.try_acquire(order_id).is_err());
    }
}
