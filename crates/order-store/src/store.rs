use std::sync::Arc;

use async_trait::async_trait;
use domain::{CustomerId, Order, OrderStatus};

use crate::{OrderId, Result, StoreError};

/// Core trait for order storage.
///
/// A store persists order records keyed by ID and owns no business logic
/// beyond refusing writes the order itself rejects. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a freshly created order.
    ///
    /// Fails with `AlreadyExists` if the ID is taken.
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Retrieves an order by ID.
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Atomically moves an order from `expected` to `next`.
    ///
    /// The read, the state machine check, the timestamp touch and the write
    /// happen as one step per key. Fails with `StatusConflict` if the stored
    /// status is not `expected`, and with `Domain` if the edge is illegal.
    async fn compare_and_set_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order>;

    /// Retrieves all orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Retrieves the orders of one customer, oldest first.
    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>>;

    /// Retrieves the orders currently in `status`, oldest first.
    ///
    /// A recovery sweep uses this to find runs stuck in a `*_PROCESSING` state.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Retrieves an order, failing with `NotFound` if it does not exist.
    async fn get_required(&self, order_id: OrderId) -> Result<Order> {
        self.get(order_id)
            .await?
            .ok_or(StoreError::NotFound(order_id))
    }

    /// Checks if an order exists.
    async fn exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get(order_id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn insert(&self, order: Order) -> Result<Order> {
        (**self).insert(order).await
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        (**self).get(order_id).await
    }

    async fn compare_and_set_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        (**self)
            .compare_and_set_status(order_id, expected, next)
            .await
    }

    async fn list(&self) -> Result<Vec<Order>> {
        (**self).list().await
    }

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        (**self).list_by_customer(customer_id).await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        (**self).list_by_status(status).await
    }
}
