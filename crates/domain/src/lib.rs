//! Domain layer for the order saga service.
//!
//! This crate provides:
//! - the `Order` entity with write-once fields
//! - the `OrderStatus` state machine that defines legal transitions
//! - the `CreateOrder` command and its validation rules

pub mod order;

pub use common::{CustomerId, Money, OrderId, ProductId};
pub use order::{CreateOrder, Order, OrderError, OrderStatus};
