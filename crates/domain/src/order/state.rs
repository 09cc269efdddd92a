//! Order state machine.

use serde::{Deserialize, Serialize};

use super::OrderError;

/// The status of an order as it moves through the fulfillment saga.
///
/// State transitions:
/// ```text
/// Pending ──► PaymentProcessing ──┬──► PaymentFailed
///                                 └──► PaymentCompleted ──► InventoryProcessing ──┬──► InventoryCompleted ──► Completed
///                                                                                 └──► InventoryFailed ──► Cancelled
/// ```
///
/// The machine is pure: [`OrderStatus::transition`] validates a requested
/// move and never performs I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been persisted and is waiting for the saga to start.
    #[default]
    Pending,

    /// Payment call is in flight.
    PaymentProcessing,

    /// Payment was captured.
    PaymentCompleted,

    /// Payment was declined or could not be completed (terminal state).
    PaymentFailed,

    /// Inventory reservation call is in flight.
    InventoryProcessing,

    /// Stock was reserved.
    InventoryCompleted,

    /// Stock could not be reserved; payment compensation follows.
    InventoryFailed,

    /// Both steps committed (terminal state).
    Completed,

    /// Compensation ran after an inventory failure (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in pipeline order.
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::PaymentProcessing,
        OrderStatus::PaymentCompleted,
        OrderStatus::PaymentFailed,
        OrderStatus::InventoryProcessing,
        OrderStatus::InventoryCompleted,
        OrderStatus::InventoryFailed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Returns the statuses reachable from this one in a single step.
    pub fn successors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::PaymentProcessing],
            OrderStatus::PaymentProcessing => {
                &[OrderStatus::PaymentCompleted, OrderStatus::PaymentFailed]
            }
            OrderStatus::PaymentCompleted => &[OrderStatus::InventoryProcessing],
            OrderStatus::InventoryProcessing => {
                &[OrderStatus::InventoryCompleted, OrderStatus::InventoryFailed]
            }
            OrderStatus::InventoryCompleted => &[OrderStatus::Completed],
            OrderStatus::InventoryFailed => &[OrderStatus::Cancelled],
            OrderStatus::PaymentFailed | OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if `next` is a legal single-step move from this status.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Validates a requested move and returns the new status.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    /// Returns true while a capability call gated by this status may be in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            OrderStatus::PaymentProcessing | OrderStatus::InventoryProcessing
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PaymentProcessing => "PAYMENT_PROCESSING",
            OrderStatus::PaymentCompleted => "PAYMENT_COMPLETED",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
            OrderStatus::InventoryProcessing => "INVENTORY_PROCESSING",
            OrderStatus::InventoryCompleted => "INVENTORY_COMPLETED",
            OrderStatus::InventoryFailed => "INVENTORY_FAILED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: [(OrderStatus, OrderStatus); 8] = [
        (OrderStatus::Pending, OrderStatus::PaymentProcessing),
        (OrderStatus::PaymentProcessing, OrderStatus::PaymentCompleted),
        (OrderStatus::PaymentProcessing, OrderStatus::PaymentFailed),
        (OrderStatus::PaymentCompleted, OrderStatus::InventoryProcessing),
        (OrderStatus::InventoryProcessing, OrderStatus::InventoryCompleted),
        (OrderStatus::InventoryProcessing, OrderStatus::InventoryFailed),
        (OrderStatus::InventoryCompleted, OrderStatus::Completed),
        (OrderStatus::InventoryFailed, OrderStatus::Cancelled),
    ];

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_every_legal_edge_is_accepted() {
        for (from, to) in EDGES {
            assert_eq!(from.transition(to).unwrap(), to, "{from} -> {to}");
        }
    }

    #[test]
    fn test_every_other_pair_is_rejected() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                if EDGES.contains(&(from, to)) {
                    continue;
                }
                let err = from.transition(to).unwrap_err();
                assert!(
                    matches!(err, OrderError::IllegalTransition { from: f, to: t } if f == from && t == to),
                    "{from} -> {to} should be illegal"
                );
            }
        }
    }

    #[test]
    fn test_no_regression_to_pending() {
        for from in OrderStatus::ALL {
            assert!(!from.can_transition_to(OrderStatus::Pending));
        }
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                OrderStatus::PaymentFailed,
                OrderStatus::Completed,
                OrderStatus::Cancelled
            ]
        );
    }

    #[test]
    fn test_in_flight_states() {
        assert!(OrderStatus::PaymentProcessing.is_in_flight());
        assert!(OrderStatus::InventoryProcessing.is_in_flight());
        assert!(!OrderStatus::Pending.is_in_flight());
        assert!(!OrderStatus::InventoryFailed.is_in_flight());
    }

    #[test]
    fn test_display_and_parse() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!(matches!(
            "SHIPPED".parse::<OrderStatus>(),
            Err(OrderError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_serialization_uses_wire_names() {
        let json = serde_json::to_string(&OrderStatus::InventoryFailed).unwrap();
        assert_eq!(json, "\"INVENTORY_FAILED\"");
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, OrderStatus::InventoryFailed);
    }
}
