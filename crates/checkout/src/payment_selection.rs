//! Payment method selection on the payment step.

use common::PaymentMethodId;
use domain::{CardDetails, CheckoutSession, CheckoutStep, PaymentMethod, SessionPatch};
use session_store::{SessionBackend, SessionStore};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::services::PaymentMethodService;

/// State of the payment selection screen.
///
/// Card details typed here are held only by this value and are never written
/// to the session.
pub struct PaymentSelectionScreen<B: SessionBackend> {
    store: SessionStore<B>,
    methods: Vec<PaymentMethod>,
    using_fallback: bool,
    chosen: Option<PaymentMethodId>,
    card: Option<CardDetails>,
}

impl<B: SessionBackend> PaymentSelectionScreen<B> {
    /// Opens the screen on the payment step or later.
    ///
    /// Loads the catalog from the service, substituting the configured
    /// fallback catalog when the service fails or returns nothing.
    #[tracing::instrument(skip_all)]
    pub async fn open<P: PaymentMethodService + ?Sized>(
        store: SessionStore<B>,
        service: &P,
        config: &CheckoutConfig,
    ) -> Result<Self> {
        let session = store.get().await;
        if session.step() < CheckoutStep::Payment {
            return Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Payment,
                actual: session.step(),
            });
        }

        let (methods, using_fallback) = match service.list().await {
            Ok(methods) if !methods.is_empty() => (methods, false),
            Ok(_) => {
                tracing::warn!("payment method catalog is empty, using fallback");
                (config.fallback_payment_methods.clone(), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "payment methods unavailable, using fallback");
                (config.fallback_payment_methods.clone(), true)
            }
        };
        if using_fallback {
            metrics::counter!("checkout_payment_catalog_fallback_total").increment(1);
        }

        let chosen = session
            .selected_payment()
            .map(|s| &s.id)
            .filter(|id| methods.iter().any(|m| &m.id == *id && m.available))
            .cloned();

        Ok(Self {
            store,
            methods,
            using_fallback,
            chosen,
            card: None,
        })
    }

    pub fn methods(&self) -> &[PaymentMethod] {
        &self.methods
    }

    /// True when the catalog shown is the fallback one.
    pub fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    pub fn chosen(&self) -> Option<&PaymentMethod> {
        let id = self.chosen.as_ref()?;
        self.methods.iter().find(|m| &m.id == id)
    }

    /// Chooses a method. Switching methods discards entered card details.
    pub fn choose(&mut self, id: &PaymentMethodId) -> Result<()> {
        let method = self
            .methods
            .iter()
            .find(|m| &m.id == id)
            .filter(|m| m.available)
            .ok_or_else(|| CheckoutError::UnavailableMethod(id.clone()))?;
        if self.chosen.as_ref() != Some(&method.id) {
            self.card = None;
        }
        self.chosen = Some(method.id.clone());
        Ok(())
    }

    /// Stores card details for the chosen card method.
    pub fn enter_card(&mut self, card: CardDetails) {
        self.card = Some(card);
    }

    /// Whether the confirm action is enabled.
    pub fn can_confirm(&self) -> bool {
        match self.chosen() {
            None => false,
            Some(method) if method.method.requires_card() => self
                .card
                .as_ref()
                .is_some_and(|card| card.validate().is_ok()),
            Some(_) => true,
        }
    }

    /// Writes the chosen method to the session and drops any card details.
    ///
    /// The step does not change; the checkout flow advances separately.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<CheckoutSession> {
        let method = self
            .chosen()
            .ok_or_else(|| {
                CheckoutError::Precondition(vec![domain::BlockingReason::MissingPayment])
            })?
            .clone();

        if method.method.requires_card() {
            let card = self
                .card
                .as_ref()
                .ok_or_else(|| CheckoutError::InvalidCard(vec!["Card details are required".to_string()]))?;
            card.validate().map_err(CheckoutError::InvalidCard)?;
            tracing::debug!(last_four = ?card.last_four(), "card details accepted");
        }

        let session = self
            .store
            .set(SessionPatch::new().selected_payment(method.to_selection()))
            .await?;
        self.card = None;
        tracing::info!(method = %method.method, id = %method.id, "payment method selected");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryPaymentMethodService;
    use common::AddressId;
    use domain::{Address, PaymentMethodKind, SummaryComposer};
    use session_store::InMemoryBackend;

    const VALID_CARD: &str = "4111 1111 1111 1111";

    async fn store_at_payment(backend: &InMemoryBackend) -> SessionStore<InMemoryBackend> {
        let store = SessionStore::open(backend.clone(), SummaryComposer::default())
            .await
            .unwrap();
        store
            .set(
                SessionPatch::new()
                    .verified_address(Address {
                        id: AddressId::new("addr-1"),
                        line1: "1 Main St".to_string(),
                        line2: None,
                        area: String::new(),
                        city: "Springfield".to_string(),
                        state: "IL".to_string(),
                        pincode: "62701".to_string(),
                        is_default: true,
                    })
                    .step(CheckoutStep::Payment),
            )
            .await
            .unwrap();
        store
    }

    fn catalog() -> Vec<PaymentMethod> {
        let mut wallet = PaymentMethod::new("wallet", PaymentMethodKind::Wallet, "Wallet", "w", "");
        wallet.available = false;
        vec![
            PaymentMethod::new("upi", PaymentMethodKind::Upi, "UPI", "upi", ""),
            PaymentMethod::new("cc", PaymentMethodKind::CreditCard, "Credit Card", "cc", ""),
            wallet,
        ]
    }

    #[tokio::test]
    async fn test_falls_back_when_service_fails() {
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        service.set_unreachable(true).await;
        let store = store_at_payment(&InMemoryBackend::new()).await;

        let screen = PaymentSelectionScreen::open(store, &service, &CheckoutConfig::default())
            .await
            .unwrap();
        assert!(screen.using_fallback());
        let names: Vec<&str> = screen.methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Cash on Delivery",
                "Debit Card",
                "Credit Card",
                "UPI",
                "Wallet",
                "Net Banking"
            ]
        );
    }

    #[tokio::test]
    async fn test_rejects_address_step() {
        let store = SessionStore::open(InMemoryBackend::new(), SummaryComposer::default())
            .await
            .unwrap();
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        let result = PaymentSelectionScreen::open(store, &service, &CheckoutConfig::default()).await;
        assert!(matches!(result, Err(CheckoutError::WrongStep { .. })));
    }

    #[tokio::test]
    async fn test_unavailable_method_cannot_be_chosen() {
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        let store = store_at_payment(&InMemoryBackend::new()).await;
        let mut screen = PaymentSelectionScreen::open(store, &service, &CheckoutConfig::default())
            .await
            .unwrap();

        let err = screen.choose(&"wallet".into()).unwrap_err();
        assert!(matches!(err, CheckoutError::UnavailableMethod(_)));
        assert!(screen.chosen().is_none());
    }

    #[tokio::test]
    async fn test_confirm_writes_selection_only() {
        let backend = InMemoryBackend::new();
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        let store = store_at_payment(&backend).await;
        let mut screen =
            PaymentSelectionScreen::open(store.clone(), &service, &CheckoutConfig::default())
                .await
                .unwrap();

        screen.choose(&"upi".into()).unwrap();
        assert!(screen.can_confirm());
        let session = screen.confirm().await.unwrap();

        assert_eq!(session.selected_payment().unwrap().id.as_str(), "upi");
        assert_eq!(session.step(), CheckoutStep::Payment);
    }

    #[tokio::test]
    async fn test_card_method_requires_valid_card() {
        let backend = InMemoryBackend::new();
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        let store = store_at_payment(&backend).await;
        let mut screen =
            PaymentSelectionScreen::open(store.clone(), &service, &CheckoutConfig::default())
                .await
                .unwrap();

        screen.choose(&"cc".into()).unwrap();
        assert!(!screen.can_confirm());

        screen.enter_card(CardDetails::new("1234", "13/99", "1", ""));
        assert!(!screen.can_confirm());
        let err = screen.confirm().await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCard(ref problems) if !problems.is_empty()));
        assert!(store.get().await.selected_payment().is_none());

        screen.enter_card(CardDetails::new(VALID_CARD, "12/99", "123", "Jane Doe"));
        assert!(screen.can_confirm());
        screen.confirm().await.unwrap();

        let stored = backend.raw("checkout.selected_payment").await.unwrap();
        assert!(stored.contains("\"credit_card\""));
        assert!(!stored.contains("4111"));
        assert!(!stored.contains("123\""));
    }

    #[tokio::test]
    async fn test_switching_method_drops_card() {
        let service = InMemoryPaymentMethodService::with_methods(catalog());
        let store = store_at_payment(&InMemoryBackend::new()).await;
        let mut screen = PaymentSelectionScreen::open(store, &service, &CheckoutConfig::default())
            .await
            .unwrap();

        screen.choose(&"cc".into()).unwrap();
        screen.enter_card(CardDetails::new(VALID_CARD, "12/99", "123", "Jane Doe"));
        assert!(screen.can_confirm());

        screen.choose(&"upi".into()).unwrap();
        screen.choose(&"cc".into()).unwrap();
        assert!(!screen.can_confirm());
    }
}
