//! Domain layer for client-side checkout orchestration.
//!
//! This crate holds the pure checkout model:
//! - `CheckoutSession` aggregate and `SessionPatch` partial updates
//! - Summary composer deriving totals from the cart and verified address
//! - Step gate deciding which forward transitions are allowed
//! - Order draft assembled at submission time
//!
//! Nothing here performs I/O.

pub mod checkout;
pub mod error;

pub use checkout::{
    Address, AddressDraft, AddressField, BlockingReason, CardDetails, Cart, CartLine,
    CheckoutSession, CheckoutStep, GateDecision, Money, OrderDraft, OrderDraftItem, OrderNotes,
    PaymentMethod, PaymentMethodKind, PaymentSelection, PricingPolicy, SessionField, SessionPatch,
    StepGate, Summary, SummaryComposer,
};
pub use error::DomainError;
