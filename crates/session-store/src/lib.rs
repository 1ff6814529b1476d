//! Persisted checkout session store.
//!
//! The store is an explicitly constructed object over an injectable
//! [`SessionBackend`]: [`InMemoryBackend`] for tests, [`SqliteBackend`] for
//! durable storage. Each session field lives under its own key and is
//! serialized independently; the derived summary is never stored.

pub mod backend;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use backend::{SessionBackend, all_keys, storage_key};
pub use error::{Result, StoreError};
pub use memory::InMemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::SessionStore;
