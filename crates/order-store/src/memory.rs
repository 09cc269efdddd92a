use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{CustomerId, Order, OrderStatus};
use tokio::sync::RwLock;

use crate::{OrderId, Result, StoreError, store::OrderStore};

/// In-memory order store implementation.
///
/// Used by tests and by the API server when no database is configured.
/// Provides the same interface as the PostgreSQL implementation; the write
/// lock is held across the read-check-write of `compare_and_set_status`.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }

    async fn filtered(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders.values().filter(|o| keep(o)).cloned().collect();
        matching.sort_by_key(|o| (o.created_at(), o.id()));
        matching
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order_id = order.id();

        if orders.contains_key(&order_id) {
            return Err(StoreError::AlreadyExists(order_id));
        }

        orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound(order_id))?;

        if order.status() != expected {
            return Err(StoreError::StatusConflict {
                order_id,
                expected,
                actual: order.status(),
            });
        }

        order.advance(next)?;
        order.touch();
        Ok(order.clone())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn list_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        Ok(self.filtered(|o| o.customer_id() == customer_id).await)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.filtered(|o| o.status() == status).await)
    }
}
