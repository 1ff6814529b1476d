//! Address service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::AddressId;
use domain::{Address, AddressDraft};
use tokio::sync::RwLock;

use crate::error::{ServiceError, ServiceKind};

/// CRUD over the customer's saved shipping addresses.
#[async_trait]
pub trait AddressService: Send + Sync {
    /// Lists saved addresses.
    async fn list(&self) -> Result<Vec<Address>, ServiceError>;

    /// Saves a new address and returns it with its assigned id.
    async fn create(&self, draft: &AddressDraft) -> Result<Address, ServiceError>;

    /// Replaces the fields of an existing address.
    async fn update(&self, id: &AddressId, draft: &AddressDraft)
    -> Result<Address, ServiceError>;

    /// Deletes an address.
    async fn delete(&self, id: &AddressId) -> Result<(), ServiceError>;

    /// Marks an address as the default.
    async fn set_default(&self, id: &AddressId) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryAddressState {
    addresses: Vec<Address>,
    next_id: u32,
    unreachable: bool,
    reject_with: Option<String>,
    create_calls: usize,
}

/// In-memory address service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressService {
    state: Arc<RwLock<InMemoryAddressState>>,
}

impl InMemoryAddressService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the service with saved addresses.
    pub async fn seed(&self, addresses: Vec<Address>) {
        let mut state = self.state.write().await;
        state.next_id += addresses.len() as u32;
        state.addresses = addresses;
    }

    /// Simulates the service being unreachable.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.write().await.unreachable = unreachable;
    }

    /// Makes mutating calls fail with `message` (or no message).
    pub async fn reject_writes(&self, message: Option<&str>) {
        self.state.write().await.reject_with = Some(message.unwrap_or_default().to_string());
    }

    /// Returns how many times `create` was called.
    pub async fn create_calls(&self) -> usize {
        self.state.read().await.create_calls
    }

    pub async fn address_count(&self) -> usize {
        self.state.read().await.addresses.len()
    }
}

fn from_draft(id: AddressId, draft: &AddressDraft) -> Address {
    Address {
        id,
        line1: draft.street.trim().to_string(),
        line2: draft.line2.clone(),
        area: draft.area.clone(),
        city: draft.city.trim().to_string(),
        state: draft.state.trim().to_string(),
        pincode: draft.zip.trim().to_string(),
        is_default: draft.is_default,
    }
}

impl InMemoryAddressState {
    fn check_reachable(&self) -> Result<(), ServiceError> {
        if self.unreachable {
            return Err(ServiceError::unreachable(ServiceKind::Address));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), ServiceError> {
        self.check_reachable()?;
        if let Some(message) = &self.reject_with {
            return Err(ServiceError::rejected(
                ServiceKind::Address,
                Some(message.clone()),
            ));
        }
        Ok(())
    }

    fn not_found(id: &AddressId) -> ServiceError {
        ServiceError::rejected(ServiceKind::Address, Some(format!("Address {id} not found")))
    }
}

#[async_trait]
impl AddressService for InMemoryAddressService {
    async fn list(&self) -> Result<Vec<Address>, ServiceError> {
        let state = self.state.read().await;
        state.check_reachable()?;
        Ok(state.addresses.clone())
    }

    async fn create(&self, draft: &AddressDraft) -> Result<Address, ServiceError> {
        let mut state = self.state.write().await;
        state.create_calls += 1;
        state.check_writable()?;

        state.next_id += 1;
        let address = from_draft(AddressId::new(format!("ADDR-{:04}", state.next_id)), draft);
        if address.is_default {
            state.addresses.iter_mut().for_each(|a| a.is_default = false);
        }
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn update(
        &self,
        id: &AddressId,
        draft: &AddressDraft,
    ) -> Result<Address, ServiceError> {
        let mut state = self.state.write().await;
        state.check_writable()?;
        let slot = state
            .addresses
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| InMemoryAddressState::not_found(id))?;
        *slot = from_draft(id.clone(), draft);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &AddressId) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        state.check_writable()?;
        let before = state.addresses.len();
        state.addresses.retain(|a| &a.id != id);
        if state.addresses.len() == before {
            return Err(InMemoryAddressState::not_found(id));
        }
        Ok(())
    }

    async fn set_default(&self, id: &AddressId) -> Result<(), ServiceError> {
        let mut state = self.state.write().await;
        state.check_writable()?;
        if !state.addresses.iter().any(|a| &a.id == id) {
            return Err(InMemoryAddressState::not_found(id));
        }
        for address in state.addresses.iter_mut() {
            address.is_default = &address.id == id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AddressDraft {
        AddressDraft::new("5 Elm St", "Shelbyville", "IL", "62565")
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let service = InMemoryAddressService::new();
        let a1 = service.create(&draft()).await.unwrap();
        let a2 = service.create(&draft()).await.unwrap();
        assert_eq!(a1.id.as_str(), "ADDR-0001");
        assert_eq!(a2.id.as_str(), "ADDR-0002");
        assert_eq!(service.list().await.unwrap().len(), 2);
        assert_eq!(service.create_calls().await, 2);
    }

    #[tokio::test]
    async fn test_set_default_is_exclusive() {
        let service = InMemoryAddressService::new();
        let a1 = service.create(&draft()).await.unwrap();
        let a2 = service.create(&draft()).await.unwrap();

        service.set_default(&a1.id).await.unwrap();
        service.set_default(&a2.id).await.unwrap();

        let defaults: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, a2.id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = InMemoryAddressService::new();
        let created = service.create(&draft()).await.unwrap();

        let mut changed = draft();
        changed.city = "Capital City".to_string();
        let updated = service.update(&created.id, &changed).await.unwrap();
        assert_eq!(updated.city, "Capital City");

        service.delete(&created.id).await.unwrap();
        assert_eq!(service.address_count().await, 0);
        assert!(service.delete(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_write_carries_message() {
        let service = InMemoryAddressService::new();
        service.reject_writes(Some("Pincode not serviceable")).await;
        let err = service.create(&draft()).await.unwrap_err();
        assert_eq!(err.display_message(), "Pincode not serviceable");
        assert_eq!(service.address_count().await, 0);
    }
}
