//! Address verification subflow.
//!
//! The only writer of the session's verified address. The customer either
//! picks one of their saved addresses or types a new one in; confirming
//! verifies it and unlocks the payment step.

use common::AddressId;
use domain::{Address, AddressDraft, BlockingReason, CheckoutSession, CheckoutStep, SessionPatch};
use session_store::{SessionBackend, SessionStore};

use crate::error::{CheckoutError, Result, ServiceError};
use crate::navigation::Route;
use crate::services::AddressService;

/// Which half of the subflow is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// Choosing from saved addresses.
    Selecting,
    /// Typing in a new address.
    ManualEntry,
}

/// State of the address verification screen.
pub struct AddressVerification<B: SessionBackend, A: AddressService> {
    store: SessionStore<B>,
    service: A,
    mode: VerificationMode,
    addresses: Vec<Address>,
    selected: Option<AddressId>,
    draft: AddressDraft,
    error: Option<ServiceError>,
}

impl<B: SessionBackend, A: AddressService> AddressVerification<B, A> {
    /// Opens the subflow and loads the saved addresses.
    ///
    /// A failed load does not fail the open: the error is kept for display
    /// and [`retry`](Self::retry) reloads.
    #[tracing::instrument(skip_all)]
    pub async fn open(store: SessionStore<B>, service: A) -> Self {
        let mut screen = Self {
            store,
            service,
            mode: VerificationMode::Selecting,
            addresses: Vec::new(),
            selected: None,
            draft: AddressDraft::default(),
            error: None,
        };
        if let Err(e) = screen.reload().await {
            tracing::debug!(error = %e, "address verification opened without addresses");
        }
        screen
    }

    /// Reloads the saved addresses after a failure.
    pub async fn retry(&mut self) -> Result<()> {
        self.reload().await
    }

    async fn reload(&mut self) -> Result<()> {
        match self.service.list().await {
            Ok(addresses) => {
                self.error = None;
                self.addresses = addresses;
                self.preselect().await;
                tracing::debug!(count = self.addresses.len(), "addresses loaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load addresses");
                self.error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Keeps the current choice if it still exists, else picks the verified
    /// address, else the default one.
    async fn preselect(&mut self) {
        if let Some(id) = &self.selected
            && self.addresses.iter().any(|a| &a.id == id)
        {
            return;
        }
        let session = self.store.get().await;
        let verified = session
            .verified_address()
            .and_then(|v| self.addresses.iter().find(|a| a.id == v.id));
        self.selected = verified
            .or_else(|| self.addresses.iter().find(|a| a.is_default))
            .map(|a| a.id.clone());
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// The last service error, if it has not been cleared by a later success.
    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    /// True when selecting and there is nothing to select.
    pub fn is_empty_state(&self) -> bool {
        self.mode == VerificationMode::Selecting && self.addresses.is_empty()
    }

    pub fn selected(&self) -> Option<&Address> {
        let id = self.selected.as_ref()?;
        self.addresses.iter().find(|a| &a.id == id)
    }

    pub fn select(&mut self, id: &AddressId) -> Result<()> {
        if !self.addresses.iter().any(|a| &a.id == id) {
            return Err(CheckoutError::UnknownAddress(id.clone()));
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    /// Switches to typing in a new address.
    pub fn enter_manually(&mut self) {
        self.mode = VerificationMode::ManualEntry;
    }

    /// Switches back to the saved addresses. The draft is kept.
    pub fn choose_saved(&mut self) {
        self.mode = VerificationMode::Selecting;
    }

    pub fn draft(&self) -> &AddressDraft {
        &self.draft
    }

    pub fn update_draft(&mut self, draft: AddressDraft) {
        self.draft = draft;
    }

    /// Whether the confirm action is enabled.
    pub fn can_confirm(&self) -> bool {
        match self.mode {
            VerificationMode::Selecting => self.selected().is_some(),
            VerificationMode::ManualEntry => self.draft.is_complete(),
        }
    }

    /// Verifies the chosen address and returns to checkout on the payment
    /// step.
    ///
    /// In manual entry the address is created first; if that fails the
    /// error is kept on the screen and the session is not touched.
    #[tracing::instrument(skip(self), fields(mode = ?self.mode))]
    pub async fn confirm(&mut self) -> Result<Route> {
        let address = match self.mode {
            VerificationMode::Selecting => self
                .selected()
                .cloned()
                .ok_or_else(|| CheckoutError::Precondition(vec![BlockingReason::MissingAddress]))?,
            VerificationMode::ManualEntry => {
                let missing = self.draft.missing_fields();
                if !missing.is_empty() {
                    return Err(CheckoutError::IncompleteAddress(missing));
                }
                let created = match self.service.create(&self.draft).await {
                    Ok(created) => created,
                    Err(e) => {
                        tracing::warn!(error = %e, "address create failed");
                        self.error = Some(e.clone());
                        return Err(e.into());
                    }
                };
                self.error = None;
                self.addresses.push(created.clone());
                self.selected = Some(created.id.clone());
                self.mode = VerificationMode::Selecting;
                self.draft = AddressDraft::default();
                created
            }
        };

        let address_id = address.id.clone();
        self.store
            .set(
                SessionPatch::new()
                    .verified_address(address)
                    .step(CheckoutStep::Payment),
            )
            .await?;
        metrics::counter!(
            "checkout_step_transitions_total",
            "from" => CheckoutStep::Address.as_str(),
            "to" => CheckoutStep::Payment.as_str()
        )
        .increment(1);
        tracing::info!(address_id = %address_id, "address verified");
        Ok(Route::Checkout)
    }

    /// Makes a saved address the default and reloads the list.
    pub async fn set_default(&mut self, id: &AddressId) -> Result<()> {
        let result = self.service.set_default(id).await;
        self.after_write(result).await
    }

    /// Deletes a saved address and reloads the list.
    ///
    /// A session that already verified this address keeps its copy.
    pub async fn delete(&mut self, id: &AddressId) -> Result<()> {
        let result = self.service.delete(id).await;
        if result.is_ok() && self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.after_write(result).await
    }

    async fn after_write(&mut self, result: std::result::Result<(), ServiceError>) -> Result<()> {
        if let Err(e) = result {
            tracing::warn!(error = %e, "address update failed");
            self.error = Some(e.clone());
            return Err(e.into());
        }
        self.reload().await
    }

    /// The current session, for display alongside the subflow.
    pub async fn session(&self) -> CheckoutSession {
        self.store.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryAddressService;
    use domain::{AddressField, SummaryComposer};
    use session_store::InMemoryBackend;

    fn saved(id: &str, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            line1: format!("{id} Main St"),
            line2: None,
            area: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            pincode: "62701".to_string(),
            is_default,
        }
    }

    async fn store() -> SessionStore<InMemoryBackend> {
        SessionStore::open(InMemoryBackend::new(), SummaryComposer::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_preselects_default() {
        let service = InMemoryAddressService::new();
        service
            .seed(vec![saved("a1", false), saved("a2", true)])
            .await;
        let screen = AddressVerification::open(store().await, service).await;

        assert_eq!(screen.mode(), VerificationMode::Selecting);
        assert_eq!(screen.selected().unwrap().id.as_str(), "a2");
        assert!(screen.can_confirm());
    }

    #[tokio::test]
    async fn test_zero_addresses_shows_empty_state() {
        let screen =
            AddressVerification::open(store().await, InMemoryAddressService::new()).await;
        assert!(screen.is_empty_state());
        assert!(!screen.can_confirm());
        assert!(screen.error().is_none());
    }

    #[tokio::test]
    async fn test_confirm_selection_verifies_and_moves_to_payment() {
        let service = InMemoryAddressService::new();
        service.seed(vec![saved("a1", false), saved("a2", true)]).await;
        let store = store().await;
        let mut screen = AddressVerification::open(store.clone(), service.clone()).await;

        screen.select(&AddressId::new("a1")).unwrap();
        assert_eq!(screen.confirm().await.unwrap(), Route::Checkout);

        let session = store.get().await;
        assert_eq!(session.verified_address(), Some(&saved("a1", false)));
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert_eq!(service.create_calls().await, 0);
    }

    #[tokio::test]
    async fn test_select_unknown_address() {
        let screen_service = InMemoryAddressService::new();
        let mut screen = AddressVerification::open(store().await, screen_service).await;
        let err = screen.select(&AddressId::new("nope")).unwrap_err();
        assert!(matches!(err, CheckoutError::UnknownAddress(_)));
    }

    #[tokio::test]
    async fn test_manual_entry_with_empty_city_never_calls_create() {
        let service = InMemoryAddressService::new();
        let store = store().await;
        let mut screen = AddressVerification::open(store.clone(), service.clone()).await;

        screen.enter_manually();
        screen.update_draft(AddressDraft::new("9 Oak Ave", "", "IL", "62701"));
        assert!(!screen.can_confirm());

        let err = screen.confirm().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::IncompleteAddress(ref fields) if fields == &vec![AddressField::City]
        ));
        assert_eq!(service.create_calls().await, 0);
        assert!(store.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_manual_entry_creates_then_verifies() {
        let service = InMemoryAddressService::new();
        let store = store().await;
        let mut screen = AddressVerification::open(store.clone(), service.clone()).await;

        screen.enter_manually();
        screen.update_draft(AddressDraft::new("9 Oak Ave", "Springfield", "IL", "62701"));
        assert!(screen.can_confirm());
        assert_eq!(screen.confirm().await.unwrap(), Route::Checkout);

        let session = store.get().await;
        assert_eq!(session.verified_address().unwrap().id.as_str(), "ADDR-0001");
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert_eq!(service.create_calls().await, 1);
    }

    #[tokio::test]
    async fn test_manual_entry_failure_keeps_subflow_open() {
        let service = InMemoryAddressService::new();
        service.reject_writes(Some("Pincode not serviceable")).await;
        let store = store().await;
        let mut screen = AddressVerification::open(store.clone(), service).await;

        screen.enter_manually();
        screen.update_draft(AddressDraft::new("9 Oak Ave", "Springfield", "IL", "00000"));
        let err = screen.confirm().await.unwrap_err();

        assert_eq!(err.user_messages(), vec!["Pincode not serviceable"]);
        assert_eq!(screen.mode(), VerificationMode::ManualEntry);
        assert_eq!(
            screen.error().map(ServiceError::display_message),
            Some("Pincode not serviceable")
        );
        assert!(store.get().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retryable() {
        let service = InMemoryAddressService::new();
        service.seed(vec![saved("a1", true)]).await;
        service.set_unreachable(true).await;
        let store = store().await;
        let mut screen = AddressVerification::open(store.clone(), service.clone()).await;

        assert!(screen.error().unwrap().retryable);
        assert!(screen.addresses().is_empty());
        assert!(store.get().await.is_empty());

        service.set_unreachable(false).await;
        screen.retry().await.unwrap();
        assert!(screen.error().is_none());
        assert_eq!(screen.selected().unwrap().id.as_str(), "a1");
    }

    #[tokio::test]
    async fn test_set_default_and_delete_reload() {
        let service = InMemoryAddressService::new();
        service.seed(vec![saved("a1", true), saved("a2", false)]).await;
        let mut screen = AddressVerification::open(store().await, service).await;

        screen.set_default(&AddressId::new("a2")).await.unwrap();
        assert!(screen.addresses().iter().any(|a| a.id.as_str() == "a2" && a.is_default));

        screen.delete(&AddressId::new("a1")).await.unwrap();
        assert_eq!(screen.addresses().len(), 1);
        assert_eq!(screen.selected().unwrap().id.as_str(), "a2");
    }
}
