//! Checkout error types.

use common::{AddressId, PaymentMethodId};
use domain::{AddressField, BlockingReason, CheckoutStep, DomainError};
use serde::Serialize;
use session_store::StoreError;
use thiserror::Error;

/// The external collaborator a call was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Cart,
    Address,
    PaymentMethods,
    Orders,
}

impl ServiceKind {
    /// Message shown when the service gave no message of its own.
    pub fn generic_message(&self) -> &'static str {
        match self {
            ServiceKind::Cart => "Unable to load your cart. Please try again.",
            ServiceKind::Address => "Unable to reach the address service. Please try again.",
            ServiceKind::PaymentMethods => "Unable to load payment methods.",
            ServiceKind::Orders => "Failed to place your order. Please try again.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Cart => "cart",
            ServiceKind::Address => "address",
            ServiceKind::PaymentMethods => "payment_methods",
            ServiceKind::Orders => "orders",
        }
    }
}

/// A failed call to an external service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} service error: {}", .service.as_str(), service_message(.service, .message))]
pub struct ServiceError {
    pub service: ServiceKind,
    /// Message returned by the service, if any.
    pub message: Option<String>,
    /// True when repeating the same call may succeed (network failures).
    pub retryable: bool,
}

impl ServiceError {
    /// The service answered but refused the request.
    pub fn rejected(service: ServiceKind, message: Option<String>) -> Self {
        Self {
            service,
            message: message.filter(|m| !m.trim().is_empty()),
            retryable: false,
        }
    }

    /// The service could not be reached.
    pub fn unreachable(service: ServiceKind) -> Self {
        Self {
            service,
            message: None,
            retryable: true,
        }
    }

    /// The message to show: the service's own, or a generic fallback.
    pub fn display_message(&self) -> &str {
        service_message(&self.service, &self.message)
    }
}

fn service_message<'a>(service: &ServiceKind, message: &'a Option<String>) -> &'a str {
    message
        .as_deref()
        .unwrap_or_else(|| service.generic_message())
}

/// A session field the payment pipeline cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    PaymentMethod,
    OrderSummary,
    ShippingAddress,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MissingField::PaymentMethod => "Payment method",
            MissingField::OrderSummary => "Order summary",
            MissingField::ShippingAddress => "Shipping address",
        })
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while orchestrating a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A step-gate rule is unmet.
    #[error("Cannot continue: {}", join(.0))]
    Precondition(Vec<BlockingReason>),

    /// Payment processing was entered without the data it needs.
    #[error("Missing checkout data: {}", join(.0))]
    DataIntegrity(Vec<MissingField>),

    /// An external service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The order service rejected the draft with field-level problems.
    #[error("Order validation failed: {}", join(.0))]
    Validation(Vec<String>),

    /// The session could not be read or written.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// The session model rejected a value.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The manual address form is incomplete.
    #[error("Address is incomplete: {} required", join(.0))]
    IncompleteAddress(Vec<AddressField>),

    /// Card details did not validate.
    #[error("Invalid card details: {}", join(.0))]
    InvalidCard(Vec<String>),

    /// The chosen address is not in the list.
    #[error("Unknown address: {0}")]
    UnknownAddress(AddressId),

    /// The chosen payment method is missing or unavailable.
    #[error("Payment method unavailable: {0}")]
    UnavailableMethod(PaymentMethodId),

    /// An operation was attempted on the wrong checkout step.
    #[error("Expected checkout step {expected}, session is on {actual}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    /// The owning screen went away before the operation finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl CheckoutError {
    /// Messages suitable for showing to the customer.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            CheckoutError::Precondition(reasons) => {
                reasons.iter().map(ToString::to_string).collect()
            }
            CheckoutError::DataIntegrity(fields) => fields
                .iter()
                .map(|f| format!("{f} is missing"))
                .collect(),
            CheckoutError::Service(err) => vec![err.display_message().to_string()],
            CheckoutError::Validation(errors) | CheckoutError::InvalidCard(errors) => {
                errors.clone()
            }
            CheckoutError::IncompleteAddress(fields) => fields
                .iter()
                .map(|f| format!("{} is required", f.as_str()))
                .collect(),
            other => vec![other.to_string()],
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
