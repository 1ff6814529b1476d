//! External service traits, in-memory implementations and the HTTP client.

pub mod address;
pub mod cart;
pub mod http;
pub mod orders;
pub mod payment_methods;

use common::OrderId;
use serde::{Deserialize, Serialize};

pub use address::{AddressService, InMemoryAddressService};
pub use cart::{CartService, InMemoryCartService};
pub use http::StorefrontClient;
pub use orders::{InMemoryOrderService, OrderService};
pub use payment_methods::{InMemoryPaymentMethodService, PaymentMethodService};

/// An order accepted by the order service.
///
/// Fields the checkout does not interpret are kept in `extra` and handed to
/// the confirmation screen untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlacedOrder {
    /// The number shown to the customer, falling back to the id.
    pub fn display_number(&self) -> &str {
        self.order_number.as_deref().unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placed_order_keeps_unknown_fields() {
        let order: PlacedOrder = serde_json::from_value(serde_json::json!({
            "id": 42,
            "status": "pending",
            "estimated_delivery": "2026-10-25"
        }))
        .unwrap();
        assert_eq!(order.id.as_str(), "42");
        assert_eq!(order.display_number(), "42");
        assert_eq!(
            order.extra.get("estimated_delivery"),
            Some(&serde_json::json!("2026-10-25"))
        );
    }
}
