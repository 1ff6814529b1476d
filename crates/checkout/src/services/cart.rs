//! Cart service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Cart;
use tokio::sync::RwLock;

use crate::error::{ServiceError, ServiceKind};

/// Read access to the customer's current cart.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the current cart contents.
    async fn current(&self) -> Result<Cart, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    cart: Cart,
    unreachable: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service already holding `cart`.
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryCartState {
                cart,
                unreachable: false,
            })),
        }
    }

    /// Replaces the cart, as if it had been mutated elsewhere.
    pub async fn replace(&self, cart: Cart) {
        self.state.write().await.cart = cart;
    }

    /// Simulates the service being unreachable.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn current(&self) -> Result<Cart, ServiceError> {
        let state = self.state.read().await;
        if state.unreachable {
            return Err(ServiceError::unreachable(ServiceKind::Cart));
        }
        Ok(state.cart.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CartLine, Money};

    #[tokio::test]
    async fn test_current_and_replace() {
        let service = InMemoryCartService::new();
        assert!(service.current().await.unwrap().is_empty());

        service
            .replace(Cart::new(vec![CartLine::new("v-1", 1, Money::from_cents(500))]))
            .await;
        assert_eq!(service.current().await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let service = InMemoryCartService::new();
        service.set_unreachable(true).await;
        let err = service.current().await.unwrap_err();
        assert!(err.retryable);
        assert_eq!(err.service, ServiceKind::Cart);
    }
}
