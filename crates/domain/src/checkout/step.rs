//! Checkout step state machine.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The step of the checkout the customer is on.
///
/// Step transitions:
/// ```text
/// Address ──► Payment ──► Review ──► (payment processing)
///    ▲           │          │
///    └───────────┴──────────┘  back is always allowed
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum CheckoutStep {
    /// Choose and verify a shipping address.
    #[default]
    Address,

    /// Choose a payment method.
    Payment,

    /// Review the order before payment processing.
    Review,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [CheckoutStep; 3] = [
        CheckoutStep::Address,
        CheckoutStep::Payment,
        CheckoutStep::Review,
    ];

    /// Returns the 1-indexed step number.
    pub fn number(&self) -> u8 {
        match self {
            CheckoutStep::Address => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Review => 3,
        }
    }

    /// Returns the following step, if any.
    pub fn next(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Address => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => Some(CheckoutStep::Review),
            CheckoutStep::Review => None,
        }
    }

    /// Returns the preceding step, or `None` at the first step.
    pub fn previous(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::Address => None,
            CheckoutStep::Payment => Some(CheckoutStep::Address),
            CheckoutStep::Review => Some(CheckoutStep::Payment),
        }
    }

    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Address => "Address",
            CheckoutStep::Payment => "Payment",
            CheckoutStep::Review => "Review",
        }
    }
}

impl TryFrom<u8> for CheckoutStep {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CheckoutStep::Address),
            2 => Ok(CheckoutStep::Payment),
            3 => Ok(CheckoutStep::Review),
            other => Err(DomainError::InvalidStep(other)),
        }
    }
}

impl From<CheckoutStep> for u8 {
    fn from(step: CheckoutStep) -> Self {
        step.number()
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.number(), self.as_str())
    }
}
