//! Payment-method catalog service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::PaymentMethod;
use tokio::sync::RwLock;

use crate::error::{ServiceError, ServiceKind};

/// Lists the payment instruments the storefront accepts.
#[async_trait]
pub trait PaymentMethodService: Send + Sync {
    async fn list(&self) -> Result<Vec<PaymentMethod>, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentMethodState {
    methods: Vec<PaymentMethod>,
    unreachable: bool,
    list_calls: usize,
}

/// In-memory payment-method service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentMethodService {
    state: Arc<RwLock<InMemoryPaymentMethodState>>,
}

impl InMemoryPaymentMethodService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_methods(methods: Vec<PaymentMethod>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryPaymentMethodState {
                methods,
                ..Default::default()
            })),
        }
    }

    /// Simulates the service being unreachable.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }

    pub async fn list_calls(&self) -> usize {
        self.state.read().await.list_calls
    }
}

#[async_trait]
impl PaymentMethodService for InMemoryPaymentMethodService {
    async fn list(&self) -> Result<Vec<PaymentMethod>, ServiceError> {
        let mut state = self.state.write().await;
        state.list_calls += 1;
        if state.unreachable {
            return Err(ServiceError::unreachable(ServiceKind::PaymentMethods));
        }
        Ok(state.methods.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::PaymentMethodKind;

    #[tokio::test]
    async fn test_list_and_unreachable() {
        let service = InMemoryPaymentMethodService::with_methods(vec![PaymentMethod::new(
            "upi",
            PaymentMethodKind::Upi,
            "UPI",
            "upi",
            "Pay with any UPI app",
        )]);
        assert_eq!(service.list().await.unwrap().len(), 1);

        service.set_unreachable(true).await;
        assert!(service.list().await.is_err());
        assert_eq!(service.list_calls().await, 2);
    }
}
