//! Cart snapshot held by the checkout session.

use common::VariantId;
use serde::{Deserialize, Serialize};

use super::value_objects::{Money, decimal};

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product variant being bought.
    pub variant_id: VariantId,

    /// Quantity in the cart.
    pub quantity: u32,

    /// Price per unit.
    #[serde(rename = "price", with = "decimal")]
    pub unit_price: Money,

    /// Display name, when the cart service provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartLine {
    /// Creates a new cart line.
    pub fn new(variant_id: impl Into<VariantId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
            unit_price,
            name: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns quantity * unit_price.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An ordered snapshot of the cart's lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, rename = "items")]
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a cart from its lines, preserving order.
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Returns the lines in cart order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Returns the sum of all line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let cart = Cart::new(vec![
            CartLine::new("v-1", 2, Money::from_cents(1000)),
            CartLine::new("v-2", 1, Money::from_cents(2500)),
        ]);
        assert_eq!(cart.subtotal(), Money::from_cents(4500));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert!(cart.subtotal().is_zero());
    }

    #[test]
    fn test_wire_format_uses_decimal_prices() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "items": [{"variant_id": 11, "quantity": 3, "price": 19.99}],
            "subtotal": 59.97
        }))
        .unwrap();
        assert_eq!(cart.lines()[0].unit_price.cents(), 1999);
        assert_eq!(cart.lines()[0].variant_id.as_str(), "11");
        assert_eq!(cart.subtotal().cents(), 5997);
    }
}
