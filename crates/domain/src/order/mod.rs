//! Order entity, state machine and creation command.

mod commands;
mod entity;
mod state;

pub use commands::CreateOrder;
pub use entity::Order;
pub use state::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status change is not an edge of the state machine.
    #[error("Illegal transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Customer ID is required.
    #[error("Customer ID is required")]
    CustomerIdRequired,

    /// Product ID is required.
    #[error("Product ID is required")]
    ProductIdRequired,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Invalid total amount.
    #[error("Invalid amount: {cents} cents (must be greater than 0)")]
    InvalidAmount { cents: i64 },

    /// A stored status string is not one of the known states.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}
