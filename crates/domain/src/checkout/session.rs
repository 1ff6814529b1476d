//! Checkout session aggregate.

use serde::{Deserialize, Serialize};

use super::address::Address;
use super::cart::Cart;
use super::gate::StepGate;
use super::payment::PaymentSelection;
use super::step::CheckoutStep;
use super::summary::{Summary, SummaryComposer};
use super::value_objects::OrderNotes;
use crate::error::DomainError;

/// The independently persisted fields of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionField {
    Step,
    VerifiedAddress,
    SelectedPayment,
    OrderNotes,
    CartSnapshot,
}

impl SessionField {
    /// Every persisted field.
    pub const ALL: [SessionField; 5] = [
        SessionField::Step,
        SessionField::VerifiedAddress,
        SessionField::SelectedPayment,
        SessionField::OrderNotes,
        SessionField::CartSnapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionField::Step => "step",
            SessionField::VerifiedAddress => "verified_address",
            SessionField::SelectedPayment => "selected_payment",
            SessionField::OrderNotes => "order_notes",
            SessionField::CartSnapshot => "cart_snapshot",
        }
    }
}

impl std::fmt::Display for SessionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The in-progress checkout held by the client.
///
/// The summary is derived state: it is recomputed whenever the session is
/// built or patched and cannot be set directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutSession {
    step: CheckoutStep,
    verified_address: Option<Address>,
    selected_payment: Option<PaymentSelection>,
    order_notes: OrderNotes,
    cart_snapshot: Cart,
    summary: Option<Summary>,
}

impl CheckoutSession {
    /// Rebuilds a session from stored fields.
    ///
    /// A stored step beyond what the data supports is pulled back to the
    /// furthest reachable step.
    pub fn from_parts(
        step: CheckoutStep,
        verified_address: Option<Address>,
        selected_payment: Option<PaymentSelection>,
        order_notes: OrderNotes,
        cart_snapshot: Cart,
        composer: &SummaryComposer,
    ) -> Self {
        let mut session = Self {
            step,
            verified_address,
            selected_payment,
            order_notes,
            cart_snapshot,
            summary: None,
        };
        session.step = session.step.min(StepGate::max_reachable_step(&session));
        session.summary = composer.compose(&session.cart_snapshot, session.verified_address.as_ref());
        session
    }

    /// Returns a new session with the patch applied and the summary
    /// recomputed. The receiver is left untouched if the result would break
    /// the step bound.
    pub fn apply(
        &self,
        patch: SessionPatch,
        composer: &SummaryComposer,
    ) -> Result<CheckoutSession, DomainError> {
        let mut next = self.clone();
        if let Some(step) = patch.step {
            next.step = step;
        }
        if let Some(address) = patch.verified_address {
            next.verified_address = address;
        }
        if let Some(payment) = patch.selected_payment {
            next.selected_payment = payment;
        }
        if let Some(notes) = patch.order_notes {
            next.order_notes = notes;
        }
        if let Some(cart) = patch.cart_snapshot {
            next.cart_snapshot = cart;
        }

        StepGate::check_step_bound(&next)?;
        next.summary = composer.compose(&next.cart_snapshot, next.verified_address.as_ref());
        Ok(next)
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn verified_address(&self) -> Option<&Address> {
        self.verified_address.as_ref()
    }

    pub fn selected_payment(&self) -> Option<&PaymentSelection> {
        self.selected_payment.as_ref()
    }

    pub fn order_notes(&self) -> &OrderNotes {
        &self.order_notes
    }

    pub fn cart_snapshot(&self) -> &Cart {
        &self.cart_snapshot
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Returns true if nothing has been entered yet.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A partial update to a [`CheckoutSession`].
///
/// Only fields that were set are written; `clear_*` methods explicitly
/// remove a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    step: Option<CheckoutStep>,
    verified_address: Option<Option<Address>>,
    selected_payment: Option<Option<PaymentSelection>>,
    order_notes: Option<OrderNotes>,
    cart_snapshot: Option<Cart>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: CheckoutStep) -> Self {
        self.step = Some(step);
        self
    }

    pub fn verified_address(mut self, address: Address) -> Self {
        self.verified_address = Some(Some(address));
        self
    }

    pub fn clear_verified_address(mut self) -> Self {
        self.verified_address = Some(None);
        self
    }

    pub fn selected_payment(mut self, payment: PaymentSelection) -> Self {
        self.selected_payment = Some(Some(payment));
        self
    }

    pub fn clear_selected_payment(mut self) -> Self {
        self.selected_payment = Some(None);
        self
    }

    pub fn order_notes(mut self, notes: OrderNotes) -> Self {
        self.order_notes = Some(notes);
        self
    }

    pub fn cart(mut self, cart: Cart) -> Self {
        self.cart_snapshot = Some(cart);
        self
    }

    /// Returns the fields this patch writes.
    pub fn touched_fields(&self) -> Vec<SessionField> {
        let mut fields = Vec::new();
        if self.step.is_some() {
            fields.push(SessionField::Step);
        }
        if self.verified_address.is_some() {
            fields.push(SessionField::VerifiedAddress);
        }
        if self.selected_payment.is_some() {
            fields.push(SessionField::SelectedPayment);
        }
        if self.order_notes.is_some() {
            fields.push(SessionField::OrderNotes);
        }
        if self.cart_snapshot.is_some() {
            fields.push(SessionField::CartSnapshot);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }
}
