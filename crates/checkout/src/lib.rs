//! Checkout orchestration for the storefront client.
//!
//! The checkout is a client-held, persisted, three-step process:
//! 1. Address: left only through the [`AddressVerification`] subflow
//! 2. Payment: a method chosen on the [`PaymentSelectionScreen`]
//! 3. Review: hands off to the [`PaymentPipeline`]
//!
//! The pipeline runs four simulated phases, submits one order draft and
//! either navigates to the confirmation screen (clearing the session) or
//! shows what went wrong and returns to checkout.

pub mod address_verification;
pub mod cancel;
pub mod config;
pub mod error;
pub mod flow;
pub mod navigation;
pub mod payment_selection;
pub mod phases;
pub mod pipeline;
pub mod services;

pub use address_verification::{AddressVerification, VerificationMode};
pub use cancel::{CancelOnDrop, CancelToken};
pub use config::{CatalogError, CheckoutConfig, default_payment_catalog, load_payment_catalog};
pub use error::{CheckoutError, MissingField, Result, ServiceError, ServiceKind};
pub use flow::{CheckoutFlow, FlowTransition};
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use payment_selection::PaymentSelectionScreen;
pub use phases::{Phase, PhaseTimings};
pub use pipeline::{
    PaymentPipeline, PipelineEvent, PipelineOutcome, PipelineReport, PipelineStatus,
    ProcessingScreen,
};
pub use services::{
    AddressService, CartService, InMemoryAddressService, InMemoryCartService,
    InMemoryOrderService, InMemoryPaymentMethodService, OrderService, PaymentMethodService,
    PlacedOrder, StorefrontClient,
};
