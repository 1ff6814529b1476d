//! Checkout session model and the rules around it.

mod address;
mod cart;
mod draft;
mod gate;
mod payment;
mod session;
mod step;
mod summary;
mod value_objects;

pub use address::{Address, AddressDraft, AddressField};
pub use cart::{Cart, CartLine};
pub use draft::{OrderDraft, OrderDraftItem};
pub use gate::{BlockingReason, GateDecision, StepGate};
pub use payment::{CardDetails, PaymentMethod, PaymentMethodKind, PaymentSelection};
pub use session::{CheckoutSession, SessionField, SessionPatch};
pub use step::CheckoutStep;
pub use summary::{PricingPolicy, Summary, SummaryComposer};
pub use value_objects::{Money, OrderNotes, decimal};
