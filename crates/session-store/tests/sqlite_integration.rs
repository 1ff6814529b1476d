//! Integration tests for the SQLite session backend.
//!
//! Each test uses its own database file in a temporary directory, so the
//! suite needs no external services.

use common::{AddressId, PaymentMethodId};
use domain::{
    Address, Cart, CartLine, CheckoutStep, Money, OrderNotes, PaymentMethodKind, PaymentSelection,
    SessionPatch, SummaryComposer,
};
use session_store::{SessionBackend, SessionStore, SqliteBackend, all_keys};
use tempfile::TempDir;

fn address() -> Address {
    Address {
        id: AddressId::new("addr-42"),
        line1: "42 Galaxy Way".to_string(),
        line2: Some("Flat 3".to_string()),
        area: "Magrathea".to_string(),
        city: "Cottington".to_string(),
        state: "CT".to_string(),
        pincode: "42424".to_string(),
        is_default: true,
    }
}

fn payment() -> PaymentSelection {
    PaymentSelection {
        method: PaymentMethodKind::Wallet,
        id: PaymentMethodId::new("wallet"),
        name: "Wallet".to_string(),
        icon: "wallet".to_string(),
        supported_instruments: Some(vec!["paytm".to_string(), "phonepe".to_string()]),
    }
}

async fn connect(dir: &TempDir) -> SqliteBackend {
    let path = dir.path().join("checkout.db");
    SqliteBackend::connect(&format!("sqlite://{}", path.display()))
        .await
        .unwrap()
}

async fn populated_store(dir: &TempDir) -> SessionStore<SqliteBackend> {
    let store = SessionStore::open(connect(dir).await, SummaryComposer::default())
        .await
        .unwrap();
    store
        .set(SessionPatch::new().cart(Cart::new(vec![
            CartLine::new("v-1", 2, Money::from_cents(1_250)).with_name("Towel"),
        ])))
        .await
        .unwrap();
    store
        .set(
            SessionPatch::new()
                .verified_address(address())
                .step(CheckoutStep::Payment),
        )
        .await
        .unwrap();
    store
        .set(
            SessionPatch::new()
                .selected_payment(payment())
                .step(CheckoutStep::Review)
                .order_notes(OrderNotes::new("Don't panic").unwrap()),
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn persist_then_reload_reproduces_session() {
    let dir = TempDir::new().unwrap();
    let before = populated_store(&dir).await.get().await;

    let reloaded = SessionStore::open(connect(&dir).await, SummaryComposer::default())
        .await
        .unwrap()
        .get()
        .await;

    assert_eq!(reloaded.step(), before.step());
    assert_eq!(reloaded.verified_address(), before.verified_address());
    assert_eq!(reloaded.selected_payment(), before.selected_payment());
    assert_eq!(reloaded.order_notes(), before.order_notes());
    assert_eq!(reloaded.cart_snapshot(), before.cart_snapshot());
    assert_eq!(reloaded.summary(), before.summary());
}

#[tokio::test]
async fn reset_erases_every_key() {
    let dir = TempDir::new().unwrap();
    let store = populated_store(&dir).await;

    store.reset().await.unwrap();
    assert!(store.get().await.is_empty());

    let backend = connect(&dir).await;
    for key in all_keys() {
        assert!(backend.load(key).await.unwrap().is_none(), "{key} survived reset");
    }

    let reopened = SessionStore::open(backend, SummaryComposer::default())
        .await
        .unwrap();
    assert!(reopened.get().await.is_empty());
}

#[tokio::test]
async fn upsert_overwrites_previous_value() {
    let dir = TempDir::new().unwrap();
    let backend = connect(&dir).await;

    backend
        .save(vec![("checkout.order_notes", "\"first\"".to_string())])
        .await
        .unwrap();
    backend
        .save(vec![("checkout.order_notes", "\"second\"".to_string())])
        .await
        .unwrap();

    assert_eq!(
        backend.load("checkout.order_notes").await.unwrap().as_deref(),
        Some("\"second\"")
    );
}

#[tokio::test]
async fn corrupt_row_is_dropped_and_cleared_by_reset() {
    let dir = TempDir::new().unwrap();
    let backend = connect(&dir).await;
    backend
        .save(vec![
            ("checkout.cart_snapshot", "{not json".to_string()),
            ("checkout.order_notes", "\"Fragile\"".to_string()),
        ])
        .await
        .unwrap();

    let store = SessionStore::open(backend, SummaryComposer::default())
        .await
        .unwrap();
    let session = store.get().await;
    assert!(session.cart_snapshot().is_empty());
    assert_eq!(session.order_notes().as_str(), "Fragile");

    store.reset().await.unwrap();
    let backend = connect(&dir).await;
    for key in all_keys() {
        assert!(backend.load(key).await.unwrap().is_none());
    }
}
