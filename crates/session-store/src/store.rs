use std::sync::Arc;

use domain::{
    Address, Cart, CheckoutSession, CheckoutStep, OrderNotes, PaymentSelection, SessionField,
    SessionPatch, SummaryComposer,
};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::backend::{SessionBackend, all_keys, storage_key};
use crate::Result;

/// The live checkout session plus its durable copy.
///
/// Every `set` and `reset` is written through to the backend before it
/// becomes visible to readers. Clones share the same live session.
pub struct SessionStore<B: SessionBackend> {
    backend: Arc<B>,
    composer: SummaryComposer,
    live: Arc<RwLock<CheckoutSession>>,
}

impl<B: SessionBackend> Clone for SessionStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            composer: self.composer,
            live: Arc::clone(&self.live),
        }
    }
}

impl<B: SessionBackend> SessionStore<B> {
    /// Opens the store, eagerly loading every persisted field.
    ///
    /// Missing keys fall back to their empty values. A value that does not
    /// decode is logged and treated as missing, so a damaged field never
    /// locks the customer out of the checkout; the next write or reset
    /// replaces it.
    #[tracing::instrument(skip_all)]
    pub async fn open(backend: B, composer: SummaryComposer) -> Result<Self> {
        let step: CheckoutStep = load_field(&backend, SessionField::Step)
            .await?
            .unwrap_or_default();
        let verified_address: Option<Option<Address>> =
            load_field(&backend, SessionField::VerifiedAddress).await?;
        let selected_payment: Option<Option<PaymentSelection>> =
            load_field(&backend, SessionField::SelectedPayment).await?;
        let order_notes: OrderNotes = load_field(&backend, SessionField::OrderNotes)
            .await?
            .unwrap_or_default();
        let cart_snapshot: Cart = load_field(&backend, SessionField::CartSnapshot)
            .await?
            .unwrap_or_default();

        let session = CheckoutSession::from_parts(
            step,
            verified_address.flatten(),
            selected_payment.flatten(),
            order_notes,
            cart_snapshot,
            &composer,
        );
        if session.step() != step {
            tracing::warn!(
                stored = %step,
                restored = %session.step(),
                "stored checkout step not supported by stored data"
            );
        }
        tracing::debug!(step = %session.step(), empty = session.is_empty(), "session loaded");

        Ok(Self {
            backend: Arc::new(backend),
            composer,
            live: Arc::new(RwLock::new(session)),
        })
    }

    /// Returns a copy of the current session.
    pub async fn get(&self) -> CheckoutSession {
        self.live.read().await.clone()
    }

    /// Returns the composer used to derive summaries.
    pub fn composer(&self) -> &SummaryComposer {
        &self.composer
    }

    /// Applies a partial update.
    ///
    /// The patch is validated and the summary recomputed first, then every
    /// touched field is written to the backend in one batch, and only then
    /// does the live session change. On any error the session is unchanged.
    #[tracing::instrument(skip_all, fields(fields = ?patch.touched_fields()))]
    pub async fn set(&self, patch: SessionPatch) -> Result<CheckoutSession> {
        let mut live = self.live.write().await;
        let touched = patch.touched_fields();
        let next = live.apply(patch, &self.composer)?;

        let mut entries = Vec::with_capacity(touched.len());
        for field in touched {
            entries.push((storage_key(field), encode_field(&next, field)?));
        }
        if !entries.is_empty() {
            self.backend.save(entries).await?;
        }

        *live = next.clone();
        metrics::counter!("checkout_session_writes_total").increment(1);
        Ok(next)
    }

    /// Clears the session: every persisted key is removed in one backend
    /// call, then the live session is emptied.
    #[tracing::instrument(skip_all)]
    pub async fn reset(&self) -> Result<()> {
        let mut live = self.live.write().await;
        self.backend.clear(&all_keys()).await?;
        *live = CheckoutSession::default();
        metrics::counter!("checkout_session_resets_total").increment(1);
        tracing::info!("checkout session reset");
        Ok(())
    }
}

async fn load_field<B, T>(backend: &B, field: SessionField) -> Result<Option<T>>
where
    B: SessionBackend,
    T: DeserializeOwned,
{
    let key = storage_key(field);
    let Some(raw) = backend.load(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt session value");
            metrics::counter!("checkout_session_corrupt_values_total", "key" => key).increment(1);
            Ok(None)
        }
    }
}

fn encode_field(session: &CheckoutSession, field: SessionField) -> Result<String> {
    let encoded = match field {
        SessionField::Step => serde_json::to_string(&session.step()),
        SessionField::VerifiedAddress => serde_json::to_string(&session.verified_address()),
        SessionField::SelectedPayment => serde_json::to_string(&session.selected_payment()),
        SessionField::OrderNotes => serde_json::to_string(session.order_notes()),
        SessionField::CartSnapshot => serde_json::to_string(session.cart_snapshot()),
    }?;
    Ok(encoded)
}
