//! Route signals handed to the external router.

use std::sync::{Arc, Mutex, PoisonError};

use crate::services::PlacedOrder;

/// A destination in the storefront.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    AddressVerification,
    Checkout,
    PaymentProcessing,
    /// Carries the order the confirmation screen displays.
    OrderConfirmation(PlacedOrder),
    Cart,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::AddressVerification => "/address-verification",
            Route::Checkout => "/checkout",
            Route::PaymentProcessing => "/payment-processing",
            Route::OrderConfirmation(_) => "/order-confirmation",
            Route::Cart => "/cart",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives navigation requests.
pub trait Navigator: Send + Sync {
    /// Dispatches a transition. Returns once the request is handed off.
    fn navigate(&self, route: Route);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn navigate(&self, route: Route) {
        (**self).navigate(route)
    }
}

/// Navigator that records every route, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<Route>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all routes navigated to so far.
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the most recent route.
    pub fn last(&self) -> Option<Route> {
        self.routes().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "navigate");
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
