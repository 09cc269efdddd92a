//! Injectable approve/decline decisions for the in-process services.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use rand::Rng;

/// Decides whether a single charge or refund is approved.
pub trait OutcomeProvider: Send + Sync + fmt::Debug {
    fn approve(&self) -> bool;
}

/// Approves every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

impl OutcomeProvider for AlwaysApprove {
    fn approve(&self) -> bool {
        true
    }
}

/// Declines every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl OutcomeProvider for AlwaysDecline {
    fn approve(&self) -> bool {
        false
    }
}

/// Replays a fixed sequence of outcomes, then falls back to a constant.
#[derive(Debug)]
pub struct Scripted {
    outcomes: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl Scripted {
    pub fn new(outcomes: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            fallback,
        }
    }
}

impl OutcomeProvider for Scripted {
    fn approve(&self) -> bool {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

/// Approves with a fixed probability. Used by the demo server only.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalRate {
    rate: f64,
}

impl ApprovalRate {
    /// Creates a provider approving with probability `rate`, clamped to `[0, 1]`.
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self { rate }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl OutcomeProvider for ApprovalRate {
    fn approve(&self) -> bool {
        rand::thread_rng().gen_bool(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_providers() {
        assert!(AlwaysApprove.approve());
        assert!(!AlwaysDecline.approve());
    }

    #[test]
    fn test_scripted_replays_then_falls_back() {
        let provider = Scripted::new([false, true], false);
        assert!(!provider.approve());
        assert!(provider.approve());
        assert!(!provider.approve());
        assert!(!provider.approve());
    }

    #[test]
    fn test_approval_rate_bounds() {
        assert!(ApprovalRate::new(1.0).approve());
        assert!(!ApprovalRate::new(0.0).approve());
        assert_eq!(ApprovalRate::new(7.5).rate(), 1.0);
        assert_eq!(ApprovalRate::new(-1.0).rate(), 0.0);
        assert_eq!(ApprovalRate::new(f64::NAN).rate(), 0.0);
    }
}
