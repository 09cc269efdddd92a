//! Order commands.

use common::{CustomerId, Money, OrderId, ProductId};

use super::OrderError;

/// Command to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: OrderId,

    /// The customer placing the order.
    pub customer_id: CustomerId,

    /// The product being ordered.
    pub product_id: ProductId,

    /// Number of units.
    pub quantity: u32,

    /// Amount to charge for the whole order.
    pub total_amount: Money,
}

impl CreateOrder {
    /// Creates a new CreateOrder command with a generated order ID.
    pub fn new(
        customer_id: impl Into<CustomerId>,
        product_id: impl Into<ProductId>,
        quantity: u32,
        total_amount: Money,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            quantity,
            total_amount,
        }
    }

    /// Uses a caller-chosen order ID instead of a generated one.
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    /// Checks the creation rules: non-blank identifiers, positive quantity and amount.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.customer_id.is_blank() {
            return Err(OrderError::CustomerIdRequired);
        }
        if self.product_id.is_blank() {
            return Err(OrderError::ProductIdRequired);
        }
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                quantity: self.quantity,
            });
        }
        if !self.total_amount.is_positive() {
            return Err(OrderError::InvalidAmount {
                cents: self.total_amount.cents(),
            });
        }
        Ok(())
    }
}
