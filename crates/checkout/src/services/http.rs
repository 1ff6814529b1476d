//! REST client for the storefront API.
//!
//! Implements every service trait against one base URL. Responses are
//! either bare payloads or wrapped as `{success, data?, message?}`.

use std::time::Duration;

use async_trait::async_trait;
use common::AddressId;
use domain::{Address, AddressDraft, Cart, OrderDraft, PaymentMethod};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{AddressService, CartService, OrderService, PaymentMethodService, PlacedOrder};
use crate::error::{CheckoutError, ServiceError, ServiceKind};

/// HTTP client for the cart, address, payment-method and order services.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    client: Client,
    base_url: String,
}

impl StorefrontClient {
    /// Creates a client with a connect timeout; request time is bounded by
    /// the callers.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and reads the body as JSON (`Null` when empty or not
    /// JSON).
    async fn send(
        &self,
        service: ServiceKind,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Value), ServiceError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(service = service.as_str(), error = %e, "request failed");
            ServiceError::unreachable(service)
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!(service = service.as_str(), error = %e, "failed to read body");
            ServiceError::unreachable(service)
        })?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok((status, body))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        service: ServiceKind,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let (status, body) = self.send(service, request).await?;
        unwrap_envelope(service, status, body)?
            .ok_or_else(|| ServiceError::rejected(service, None))
    }

    async fn execute(
        &self,
        service: ServiceKind,
        request: RequestBuilder,
    ) -> Result<(), ServiceError> {
        let (status, body) = self.send(service, request).await?;
        unwrap_envelope::<Value>(service, status, body).map(|_| ())
    }
}

fn message_of(body: &Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Interprets a response body, unwrapping `{success, data, message}` when
/// present. `Ok(None)` means the service succeeded without data.
fn unwrap_envelope<T: DeserializeOwned>(
    service: ServiceKind,
    status: StatusCode,
    body: Value,
) -> Result<Option<T>, ServiceError> {
    let success = body.get("success").and_then(Value::as_bool);
    if !status.is_success() || success == Some(false) {
        return Err(ServiceError::rejected(service, message_of(&body)));
    }

    let payload = match success {
        Some(_) => body.get("data").cloned().unwrap_or(Value::Null),
        None => body,
    };
    if payload.is_null() {
        return Ok(None);
    }
    serde_json::from_value(payload).map(Some).map_err(|e| {
        tracing::warn!(service = service.as_str(), error = %e, "malformed response");
        ServiceError::rejected(service, None)
    })
}

/// Pulls `validation_errors` out of an order response, if any.
fn validation_errors(body: &Value) -> Option<Vec<String>> {
    let errors = body
        .get("validation_errors")
        .or_else(|| body.get("data").and_then(|d| d.get("validation_errors")))?
        .as_array()?;
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => e.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect();
    (!messages.is_empty()).then_some(messages)
}

#[async_trait]
impl CartService for StorefrontClient {
    #[tracing::instrument(skip(self))]
    async fn current(&self) -> Result<Cart, ServiceError> {
        let request = self.client.get(self.url("/cart"));
        let (status, body) = self.send(ServiceKind::Cart, request).await?;
        Ok(unwrap_envelope(ServiceKind::Cart, status, body)?.unwrap_or_default())
    }
}

#[async_trait]
impl AddressService for StorefrontClient {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Address>, ServiceError> {
        let request = self.client.get(self.url("/addresses"));
        let (status, body) = self.send(ServiceKind::Address, request).await?;
        Ok(unwrap_envelope(ServiceKind::Address, status, body)?.unwrap_or_default())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn create(&self, draft: &AddressDraft) -> Result<Address, ServiceError> {
        let request = self.client.post(self.url("/addresses")).json(draft);
        self.fetch(ServiceKind::Address, request).await
    }

    #[tracing::instrument(skip(self, draft), fields(address_id = %id))]
    async fn update(
        &self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<Address, ServiceError> {
        let request = self
            .client
            .put(self.url(&format!("/addresses/{id}")))
            .json(draft);
        self.fetch(ServiceKind::Address, request).await
    }

    #[tracing::instrument(skip(self), fields(address_id = %id))]
    async fn delete(&self, id: &AddressId) -> Result<(), ServiceError> {
        let request = self.client.delete(self.url(&format!("/addresses/{id}")));
        self.execute(ServiceKind::Address, request).await
    }

    #[tracing::instrument(skip(self), fields(address_id = %id))]
    async fn set_default(&self, id: &AddressId) -> Result<(), ServiceError> {
        let request = self
            .client
            .post(self.url(&format!("/addresses/{id}/default")));
        self.execute(ServiceKind::Address, request).await
    }
}

#[async_trait]
impl PaymentMethodService for StorefrontClient {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<PaymentMethod>, ServiceError> {
        let request = self.client.get(self.url("/payments/methods"));
        self.fetch(ServiceKind::PaymentMethods, request).await
    }
}

#[async_trait]
impl OrderService for StorefrontClient {
    #[tracing::instrument(skip(self, draft), fields(total = %draft.total_amount))]
    async fn create(&self, draft: &OrderDraft) -> Result<PlacedOrder, CheckoutError> {
        let request = self.client.post(self.url("/orders")).json(draft);
        let (status, body) = self.send(ServiceKind::Orders, request).await?;

        if let Some(errors) = validation_errors(&body) {
            return Err(CheckoutError::Validation(errors));
        }
        unwrap_envelope(ServiceKind::Orders, status, body)?
            .ok_or_else(|| ServiceError::rejected(ServiceKind::Orders, None).into())
    }
}
