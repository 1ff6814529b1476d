//! Domain error types.

use thiserror::Error;

use crate::checkout::{BlockingReason, CheckoutStep};

/// Errors raised by the checkout model when a value or transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A step number outside 1..=3 was supplied.
    #[error("Invalid checkout step: {0} (must be 1, 2 or 3)")]
    InvalidStep(u8),

    /// Order notes exceed the character limit.
    #[error("Order notes too long: {length} characters (max {max})")]
    NotesTooLong { length: usize, max: usize },

    /// The requested step is beyond what the session's data allows.
    #[error("Cannot reach step {requested}: {}", join_reasons(.reasons))]
    StepNotReachable {
        requested: CheckoutStep,
        reasons: Vec<BlockingReason>,
    },
}

fn join_reasons(reasons: &[BlockingReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
