//! Identifier types shared across the checkout crates.

pub mod types;

pub use types::{AddressId, OrderId, PaymentMethodId, VariantId};
