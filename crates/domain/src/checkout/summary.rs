//! Order summary derived from the cart and the verified address.

use common::AddressId;
use serde::Serialize;

use super::address::Address;
use super::cart::Cart;
use super::value_objects::{Money, decimal};

/// Shipping fee and tax rate applied to every checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Flat shipping fee.
    pub shipping_fee: Money,
    /// Tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_fee: Money::from_cents(999),
            tax_rate_bps: 800,
        }
    }
}

/// Totals for the order being checked out.
///
/// Only [`SummaryComposer`] builds summaries, so `total` always equals
/// `subtotal + shipping + tax`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(with = "decimal")]
    subtotal: Money,
    #[serde(with = "decimal")]
    shipping: Money,
    #[serde(with = "decimal")]
    tax: Money,
    #[serde(with = "decimal")]
    total: Money,
    address_id: AddressId,
}

impl Summary {
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn shipping(&self) -> Money {
        self.shipping
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// The address the totals were computed for.
    pub fn address_id(&self) -> &AddressId {
        &self.address_id
    }
}

/// Derives a [`Summary`] from the cart and the verified address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryComposer {
    policy: PricingPolicy,
}

impl SummaryComposer {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    /// Computes the summary, or `None` when there is no address or the cart
    /// is empty. A missing input never yields a zeroed summary.
    pub fn compose(&self, cart: &Cart, address: Option<&Address>) -> Option<Summary> {
        let address = address?;
        if cart.is_empty() {
            return None;
        }

        let subtotal = cart.subtotal();
        let shipping = self.policy.shipping_fee;
        let tax = subtotal.apply_rate_bps(self.policy.tax_rate_bps);

        Some(Summary {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
            address_id: address.id.clone(),
        })
    }
}
