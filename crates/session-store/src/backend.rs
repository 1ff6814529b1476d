use async_trait::async_trait;
use domain::SessionField;

use crate::Result;

/// Storage key for a persisted session field.
pub fn storage_key(field: SessionField) -> &'static str {
    match field {
        SessionField::Step => "checkout.step",
        SessionField::VerifiedAddress => "checkout.verified_address",
        SessionField::SelectedPayment => "checkout.selected_payment",
        SessionField::OrderNotes => "checkout.order_notes",
        SessionField::CartSnapshot => "checkout.cart_snapshot",
    }
}

/// Every key the session occupies.
pub fn all_keys() -> Vec<&'static str> {
    SessionField::ALL.into_iter().map(storage_key).collect()
}

/// Durable key/value storage behind the session store.
///
/// Values are JSON strings, one per session field. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Reads the value stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Writes all entries atomically: either every entry is stored or none.
    async fn save(&self, entries: Vec<(&'static str, String)>) -> Result<()>;

    /// Removes the given keys atomically.
    async fn clear(&self, keys: &[&'static str]) -> Result<()>;
}
