//! Checkout configuration.

use std::path::Path;
use std::time::Duration;

use domain::{PaymentMethod, PaymentMethodKind, PricingPolicy};
use thiserror::Error;

use crate::phases::PhaseTimings;

/// Error loading a payment catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read payment catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid payment catalog {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Payment catalog {path} is empty")]
    Empty { path: String },
}

/// Tunables for the checkout orchestration.
///
/// Defaults:
/// - shipping $9.99, tax 8%
/// - phase durations 2s / 3s / 2s / 1s
/// - 5 second redirect countdown, ticking every second
/// - 30 second timeout on order creation
/// - six-method fallback payment catalog
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub pricing: PricingPolicy,
    pub phase_timings: PhaseTimings,
    /// Seconds shown on the countdown before redirecting back to checkout.
    pub redirect_countdown_secs: u32,
    /// Interval between countdown ticks.
    pub countdown_tick: Duration,
    /// Upper bound on the order-create call.
    pub order_timeout: Duration,
    /// Catalog used when the payment-method service is unavailable.
    pub fallback_payment_methods: Vec<PaymentMethod>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            pricing: PricingPolicy::default(),
            phase_timings: PhaseTimings::default(),
            redirect_countdown_secs: 5,
            countdown_tick: Duration::from_secs(1),
            order_timeout: Duration::from_secs(30),
            fallback_payment_methods: default_payment_catalog(),
        }
    }
}

impl CheckoutConfig {
    /// Replaces the fallback catalog with the JSON array stored at `path`.
    pub fn with_fallback_catalog_file(
        mut self,
        path: impl AsRef<Path>,
    ) -> Result<Self, CatalogError> {
        self.fallback_payment_methods = load_payment_catalog(path)?;
        Ok(self)
    }

    /// Total time of the redirect countdown.
    pub fn redirect_delay(&self) -> Duration {
        self.countdown_tick * self.redirect_countdown_secs
    }
}

/// Reads a payment catalog: a JSON array of payment methods.
pub fn load_payment_catalog(path: impl AsRef<Path>) -> Result<Vec<PaymentMethod>, CatalogError> {
    let path_ref = path.as_ref();
    let display = path_ref.display().to_string();
    let raw = std::fs::read_to_string(path_ref).map_err(|source| CatalogError::Io {
        path: display.clone(),
        source,
    })?;
    let methods: Vec<PaymentMethod> =
        serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: display.clone(),
            source,
        })?;
    if methods.is_empty() {
        return Err(CatalogError::Empty { path: display });
    }
    Ok(methods)
}

/// The built-in fallback catalog.
pub fn default_payment_catalog() -> Vec<PaymentMethod> {
    vec![
        PaymentMethod::new(
            "cod",
            PaymentMethodKind::Cod,
            "Cash on Delivery",
            "cash",
            "Pay in cash when your order arrives",
        ),
        PaymentMethod::new(
            "debit_card",
            PaymentMethodKind::DebitCard,
            "Debit Card",
            "credit-card",
            "Visa, Mastercard, RuPay debit cards",
        ),
        PaymentMethod::new(
            "credit_card",
            PaymentMethodKind::CreditCard,
            "Credit Card",
            "credit-card",
            "Visa, Mastercard, Amex credit cards",
        ),
        PaymentMethod::new(
            "upi",
            PaymentMethodKind::Upi,
            "UPI",
            "smartphone",
            "Pay using any UPI app",
        ),
        PaymentMethod::new(
            "wallet",
            PaymentMethodKind::Wallet,
            "Wallet",
            "wallet",
            "Paytm, PhonePe and other wallets",
        ),
        PaymentMethod::new(
            "net_banking",
            PaymentMethodKind::NetBanking,
            "Net Banking",
            "landmark",
            "All major banks supported",
        ),
    ]
}
