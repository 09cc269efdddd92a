//! Order fulfillment saga constants.

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Charge the customer for the order.
pub const STEP_PROCESS_PAYMENT: &str = "process_payment";

/// Step name: Reserve stock for the ordered product.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Compensation name: Refund a completed payment.
pub const COMPENSATE_REFUND_PAYMENT: &str = "refund_payment";

/// Compensation name: Return reserved stock.
pub const COMPENSATE_RELEASE_INVENTORY: &str = "release_inventory";
