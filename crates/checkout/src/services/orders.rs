//! Order service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::OrderDraft;
use tokio::sync::RwLock;

use super::PlacedOrder;
use crate::error::{CheckoutError, ServiceError, ServiceKind};

/// Accepts order drafts.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Submits a draft.
    ///
    /// Fails with [`CheckoutError::Validation`] when the service returns
    /// field-level problems, and [`CheckoutError::Service`] otherwise.
    async fn create(&self, draft: &OrderDraft) -> Result<PlacedOrder, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    drafts: Vec<OrderDraft>,
    next_id: u32,
    validation_errors: Option<Vec<String>>,
    reject_with: Option<Option<String>>,
    hang: bool,
}

/// In-memory order service for testing.
///
/// Every call is recorded, including ones that fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next calls fail with these validation errors.
    pub async fn set_validation_errors(&self, errors: Vec<String>) {
        self.state.write().await.validation_errors = Some(errors);
    }

    /// Makes the next calls fail with an optional service message.
    pub async fn set_fail_on_create(&self, message: Option<&str>) {
        self.state.write().await.reject_with = Some(message.map(str::to_string));
    }

    /// Makes calls never complete.
    pub async fn set_hang(&self, hang: bool) {
        self.state.write().await.hang = hang;
    }

    /// Returns how many times `create` was called.
    pub async fn create_calls(&self) -> usize {
        self.state.read().await.drafts.len()
    }

    /// Returns every submitted draft, in order.
    pub async fn drafts(&self) -> Vec<OrderDraft> {
        self.state.read().await.drafts.clone()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create(&self, draft: &OrderDraft) -> Result<PlacedOrder, CheckoutError> {
        let hang = {
            let mut state = self.state.write().await;
            state.drafts.push(draft.clone());

            if let Some(errors) = &state.validation_errors {
                return Err(CheckoutError::Validation(errors.clone()));
            }
            if let Some(message) = &state.reject_with {
                return Err(ServiceError::rejected(ServiceKind::Orders, message.clone()).into());
            }
            state.hang
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.write().await;
        state.next_id += 1;
        let number = format!("ORD-{:04}", state.next_id);
        Ok(PlacedOrder {
            id: OrderId::new(state.next_id.to_string()),
            order_number: Some(number),
            status: Some("pending".to_string()),
            total_amount: Some(draft.total_amount.as_decimal()),
            extra: serde_json::Map::new(),
        })
    }
}
