//! Step gate: which forward transitions the session currently allows.

use serde::Serialize;

use super::session::CheckoutSession;
use super::step::CheckoutStep;
use super::value_objects::OrderNotes;
use crate::error::DomainError;

/// A requirement the session does not yet satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockingReason {
    MissingAddress,
    MissingPayment,
    NotesTooLong { length: usize },
    EmptyCart,
}

impl std::fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockingReason::MissingAddress => f.write_str("Shipping address is required"),
            BlockingReason::MissingPayment => f.write_str("Payment method is required"),
            BlockingReason::NotesTooLong { length } => write!(
                f,
                "Order notes must be {} characters or fewer ({length} entered)",
                OrderNotes::MAX_CHARS
            ),
            BlockingReason::EmptyCart => f.write_str("Cart is empty"),
        }
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub ok: bool,
    pub blocking_reasons: Vec<BlockingReason>,
}

impl GateDecision {
    fn from_reasons(blocking_reasons: Vec<BlockingReason>) -> Self {
        Self {
            ok: blocking_reasons.is_empty(),
            blocking_reasons,
        }
    }
}

/// Rules governing forward navigation through the checkout.
///
/// Backward navigation is never gated.
pub struct StepGate;

impl StepGate {
    /// Lists every unmet requirement for placing the order, independent of
    /// the current step.
    pub fn validate(session: &CheckoutSession) -> Vec<BlockingReason> {
        let mut reasons = Vec::new();
        if session.verified_address().is_none() {
            reasons.push(BlockingReason::MissingAddress);
        }
        if session.selected_payment().is_none() {
            reasons.push(BlockingReason::MissingPayment);
        }
        if !session.order_notes().within_limit() {
            reasons.push(BlockingReason::NotesTooLong {
                length: session.order_notes().len(),
            });
        }
        if session.cart_snapshot().is_empty() {
            reasons.push(BlockingReason::EmptyCart);
        }
        reasons
    }

    /// Checks whether the session may leave its current step going forward.
    ///
    /// From the review step "forward" means entering payment processing.
    pub fn can_advance(session: &CheckoutSession) -> GateDecision {
        match session.step() {
            CheckoutStep::Address => GateDecision::from_reasons(
                session
                    .verified_address()
                    .is_none()
                    .then_some(BlockingReason::MissingAddress)
                    .into_iter()
                    .collect(),
            ),
            CheckoutStep::Payment => GateDecision::from_reasons(
                session
                    .selected_payment()
                    .is_none()
                    .then_some(BlockingReason::MissingPayment)
                    .into_iter()
                    .collect(),
            ),
            CheckoutStep::Review => Self::can_enter_processing(session),
        }
    }

    /// Checks whether payment processing may start.
    ///
    /// Requires the address, the payment method, notes within the limit and
    /// a settled summary.
    pub fn can_enter_processing(session: &CheckoutSession) -> GateDecision {
        let reasons = Self::validate(session);
        debug_assert!(!reasons.is_empty() || session.summary().is_some());
        GateDecision::from_reasons(reasons)
    }

    /// Returns the furthest step the session's data supports: one step per
    /// satisfied precondition, counted in order.
    pub fn max_reachable_step(session: &CheckoutSession) -> CheckoutStep {
        match (
            session.verified_address().is_some(),
            session.selected_payment().is_some(),
        ) {
            (false, _) => CheckoutStep::Address,
            (true, false) => CheckoutStep::Payment,
            (true, true) => CheckoutStep::Review,
        }
    }

    /// Fails if the session sits on a step its data does not support.
    pub fn check_step_bound(session: &CheckoutSession) -> Result<(), DomainError> {
        let requested = session.step();
        if requested <= Self::max_reachable_step(session) {
            return Ok(());
        }
        let reasons = Self::validate(session)
            .into_iter()
            .filter(|r| match r {
                BlockingReason::MissingAddress => true,
                BlockingReason::MissingPayment => requested == CheckoutStep::Review,
                _ => false,
            })
            .collect();
        Err(DomainError::StepNotReachable { requested, reasons })
    }
}
