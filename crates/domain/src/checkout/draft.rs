//! Order draft submitted to the order service.

use common::{AddressId, VariantId};
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::summary::Summary;
use super::value_objects::{Money, decimal};

/// One line of an order draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraftItem {
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(with = "decimal")]
    pub price: Money,
}

/// The payload of `POST /orders`.
///
/// Built at submission time from the summary and cart snapshot; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub address_id: AddressId,
    pub items: Vec<OrderDraftItem>,
    #[serde(with = "decimal")]
    pub total_amount: Money,
    #[serde(with = "decimal")]
    pub subtotal: Money,
    #[serde(with = "decimal")]
    pub tax_amount: Money,
    #[serde(with = "decimal")]
    pub delivery_fee: Money,
    #[serde(with = "decimal")]
    pub discount_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

impl OrderDraft {
    /// Builds the draft, mapping each cart line to `{variant_id, quantity,
    /// price}` in cart order.
    pub fn build(summary: &Summary, cart: &Cart) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| OrderDraftItem {
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();

        Self {
            address_id: summary.address_id().clone(),
            items,
            total_amount: summary.total(),
            subtotal: summary.subtotal(),
            tax_amount: summary.tax(),
            delivery_fee: summary.shipping(),
            discount_amount: Money::zero(),
            coupon_code: None,
        }
    }
}
