//! The main checkout screen: moving between steps.

use domain::{
    BlockingReason, CheckoutSession, CheckoutStep, OrderNotes, SessionPatch, StepGate,
};
use session_store::{SessionBackend, SessionStore};

use crate::error::{CheckoutError, Result};
use crate::navigation::Route;
use crate::services::CartService;

/// What a navigation request on the checkout screen led to.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowTransition {
    /// The session moved to another step.
    Step(CheckoutStep),
    /// Control passes to another screen.
    Navigate(Route),
    /// Forward navigation is not allowed yet.
    Blocked(Vec<BlockingReason>),
}

/// Drives the three checkout steps.
///
/// The address step is only left through the address verification subflow;
/// this controller never writes the verified address.
pub struct CheckoutFlow<B: SessionBackend> {
    store: SessionStore<B>,
}

impl<B: SessionBackend> CheckoutFlow<B> {
    pub fn new(store: SessionStore<B>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SessionStore<B> {
        &self.store
    }

    /// Enters checkout, refreshing the cart snapshot from the cart service.
    #[tracing::instrument(skip_all)]
    pub async fn enter<C: CartService + ?Sized>(&self, carts: &C) -> Result<CheckoutSession> {
        let cart = carts.current().await?;
        tracing::debug!(lines = cart.lines().len(), "cart snapshot refreshed");
        Ok(self.store.set(SessionPatch::new().cart(cart)).await?)
    }

    pub async fn session(&self) -> CheckoutSession {
        self.store.get().await
    }

    /// Every unmet requirement for placing the order.
    pub async fn blocking_reasons(&self) -> Vec<BlockingReason> {
        StepGate::validate(&self.store.get().await)
    }

    /// Tries to move forward from the current step.
    #[tracing::instrument(skip(self))]
    pub async fn advance(&self) -> Result<FlowTransition> {
        let session = self.store.get().await;
        let from = session.step();

        let transition = match from {
            CheckoutStep::Address => match session.verified_address() {
                Some(_) => self.move_to(from, CheckoutStep::Payment).await?,
                None => FlowTransition::Navigate(Route::AddressVerification),
            },
            CheckoutStep::Payment => {
                let decision = StepGate::can_advance(&session);
                if decision.ok {
                    self.move_to(from, CheckoutStep::Review).await?
                } else {
                    FlowTransition::Blocked(decision.blocking_reasons)
                }
            }
            CheckoutStep::Review => processing_transition(&session),
        };

        if let FlowTransition::Blocked(reasons) = &transition {
            tracing::info!(step = %from, ?reasons, "advance blocked");
        }
        Ok(transition)
    }

    /// Checks that payment processing may start: the session must be on the
    /// review step and pass the processing gate. Nothing is written.
    #[tracing::instrument(skip(self))]
    pub async fn enter_processing(&self) -> Result<FlowTransition> {
        let session = self.store.get().await;
        if session.step() != CheckoutStep::Review {
            tracing::info!(step = %session.step(), "payment processing requested before review");
            return Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Review,
                actual: session.step(),
            });
        }
        Ok(processing_transition(&session))
    }

    /// Moves back one step, or out to the cart from the first step.
    #[tracing::instrument(skip(self))]
    pub async fn back(&self) -> Result<FlowTransition> {
        let from = self.store.get().await.step();
        match from.previous() {
            Some(to) => self.move_to(from, to).await,
            None => Ok(FlowTransition::Navigate(Route::Cart)),
        }
    }

    /// Replaces the order notes.
    pub async fn set_notes(&self, text: impl Into<String>) -> Result<CheckoutSession> {
        let notes = OrderNotes::new(text)?;
        Ok(self.store.set(SessionPatch::new().order_notes(notes)).await?)
    }

    /// Abandons the checkout: the session is cleared and the customer goes
    /// back to the cart.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self) -> Result<Route> {
        self.store.reset().await?;
        tracing::info!("checkout abandoned");
        Ok(Route::Cart)
    }

    async fn move_to(&self, from: CheckoutStep, to: CheckoutStep) -> Result<FlowTransition> {
        self.store
            .set(SessionPatch::new().step(to))
            .await
            .map_err(CheckoutError::from)?;
        metrics::counter!(
            "checkout_step_transitions_total",
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
        tracing::info!(from = %from, to = %to, "checkout step changed");
        Ok(FlowTransition::Step(to))
    }
}

fn processing_transition(session: &CheckoutSession) -> FlowTransition {
    let decision = StepGate::can_enter_processing(session);
    if decision.ok {
        FlowTransition::Navigate(Route::PaymentProcessing)
    } else {
        FlowTransition::Blocked(decision.blocking_reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryCartService;
    use common::AddressId;
    use domain::{Address, Cart, CartLine, Money, PaymentMethod, PaymentMethodKind, SummaryComposer};
    use session_store::InMemoryBackend;

    fn address() -> Address {
        Address {
            id: AddressId::new("addr-1"),
            line1: "1 Main St".to_string(),
            line2: None,
            area: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            pincode: "62701".to_string(),
            is_default: true,
        }
    }

    async fn flow() -> CheckoutFlow<InMemoryBackend> {
        let store = SessionStore::open(InMemoryBackend::new(), SummaryComposer::default())
            .await
            .unwrap();
        CheckoutFlow::new(store)
    }

    #[tokio::test]
    async fn test_enter_snapshots_cart() {
        let flow = flow().await;
        let carts = InMemoryCartService::with_cart(Cart::new(vec![CartLine::new(
            "v-1",
            2,
            Money::from_dollars(50),
        )]));

        let session = flow.enter(&carts).await.unwrap();
        assert_eq!(session.cart_snapshot().subtotal(), Money::from_dollars(100));
        assert_eq!(session.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_enter_with_unreachable_cart_keeps_session() {
        let flow = flow().await;
        let carts = InMemoryCartService::new();
        carts.set_unreachable(true).await;

        let err = flow.enter(&carts).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Service(_)));
        assert!(flow.session().await.is_empty());
    }

    #[tokio::test]
    async fn test_advance_from_address_routes_to_verification() {
        let flow = flow().await;
        assert_eq!(
            flow.advance().await.unwrap(),
            FlowTransition::Navigate(Route::AddressVerification)
        );
        assert_eq!(flow.session().await.step(), CheckoutStep::Address);
    }

    #[tokio::test]
    async fn test_advance_through_steps() {
        let flow = flow().await;
        flow.store()
            .set(
                SessionPatch::new()
                    .verified_address(address())
                    .step(CheckoutStep::Payment),
            )
            .await
            .unwrap();

        assert_eq!(
            flow.advance().await.unwrap(),
            FlowTransition::Blocked(vec![BlockingReason::MissingPayment])
        );

        let upi = PaymentMethod::new("upi", PaymentMethodKind::Upi, "UPI", "upi", "UPI");
        flow.store()
            .set(SessionPatch::new().selected_payment(upi.to_selection()))
            .await
            .unwrap();
        assert_eq!(
            flow.advance().await.unwrap(),
            FlowTransition::Step(CheckoutStep::Review)
        );

        // Empty cart blocks processing.
        assert_eq!(
            flow.advance().await.unwrap(),
            FlowTransition::Blocked(vec![BlockingReason::EmptyCart])
        );

        flow.enter(&InMemoryCartService::with_cart(Cart::new(vec![CartLine::new(
            "v-1",
            1,
            Money::from_dollars(10),
        )])))
        .await
        .unwrap();
        assert_eq!(
            flow.advance().await.unwrap(),
            FlowTransition::Navigate(Route::PaymentProcessing)
        );
    }

    #[tokio::test]
    async fn test_processing_requires_review_step() {
        let flow = flow().await;
        flow.enter(&InMemoryCartService::with_cart(Cart::new(vec![CartLine::new(
            "v-1",
            1,
            Money::from_dollars(10),
        )])))
        .await
        .unwrap();
        let cod = PaymentMethod::new("cod", PaymentMethodKind::Cod, "COD", "cash", "");
        flow.store()
            .set(
                SessionPatch::new()
                    .verified_address(address())
                    .selected_payment(cod.to_selection())
                    .step(CheckoutStep::Payment),
            )
            .await
            .unwrap();

        let err = flow.enter_processing().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::WrongStep {
                expected: CheckoutStep::Review,
                actual: CheckoutStep::Payment
            }
        ));
        assert_eq!(flow.session().await.step(), CheckoutStep::Payment);

        flow.advance().await.unwrap();
        assert_eq!(
            flow.enter_processing().await.unwrap(),
            FlowTransition::Navigate(Route::PaymentProcessing)
        );
    }

    #[tokio::test]
    async fn test_back_is_never_blocked() {
        let flow = flow().await;
        assert_eq!(
            flow.back().await.unwrap(),
            FlowTransition::Navigate(Route::Cart)
        );

        flow.store()
            .set(
                SessionPatch::new()
                    .verified_address(address())
                    .step(CheckoutStep::Payment),
            )
            .await
            .unwrap();
        assert_eq!(
            flow.back().await.unwrap(),
            FlowTransition::Step(CheckoutStep::Address)
        );
        assert!(flow.session().await.verified_address().is_some());
    }

    #[tokio::test]
    async fn test_notes_limit() {
        let flow = flow().await;
        flow.set_notes("Leave at the door").await.unwrap();
        assert_eq!(flow.session().await.order_notes().as_str(), "Leave at the door");

        let err = flow.set_notes("x".repeat(501)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Domain(_)));
        assert_eq!(flow.session().await.order_notes().as_str(), "Leave at the door");
    }

    #[tokio::test]
    async fn test_cancel_resets_session() {
        let flow = flow().await;
        flow.set_notes("hello").await.unwrap();
        assert_eq!(flow.cancel().await.unwrap(), Route::Cart);
        assert!(flow.session().await.is_empty());
    }
}
