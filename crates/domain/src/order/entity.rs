//! Order entity.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::Serialize;

use super::{CreateOrder, OrderError, OrderStatus};

/// An order record.
///
/// Identity, customer, product, quantity and amount are fixed at creation and
/// only readable afterwards. The status moves exclusively through
/// [`Order::advance`], which consults the state machine. Timestamps are
/// refreshed by an explicit [`Order::touch`] from whoever persists the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    product_id: ProductId,
    quantity: u32,
    total_amount: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Validates the command and builds a new order in `PENDING`.
    pub fn create(cmd: CreateOrder) -> Result<Self, OrderError> {
        cmd.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: cmd.order_id,
            customer_id: cmd.customer_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            total_amount: cmd.total_amount,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from a persisted row.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        total_amount: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            product_id,
            quantity,
            total_amount,
            status,
            created_at,
            updated_at,
        }
    }

    /// Moves the order to `next` if the state machine allows it.
    pub fn advance(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        self.status = self.status.transition(next)?;
        Ok(self.status)
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
