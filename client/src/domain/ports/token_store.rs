//! Driven port for the persistent key-value session storage.
//!
//! The client reads the bearer token through this port on every request and
//! clears it when the backend reports an authentication failure. Hosts
//! supply the backing storage; the in-memory store doubles as the test
//! fixture and as the store for short-lived embedded clients.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by session storage adapters.
    pub enum TokenStoreError {
        /// The backing storage could not be read or written.
        Unavailable { message: String } =>
            "session storage unavailable: {message}",
        /// Stored data exists but cannot be interpreted.
        Corrupt { message: String } =>
            "session storage is corrupt: {message}",
    }
}

/// Synchronous key-value storage holding session state.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;

    /// Delete `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

/// Process-local store backed by a mutex-guarded map.
///
/// # Examples
/// ```
/// use erp_client::domain::ports::{MemoryTokenStore, TokenStore};
///
/// let store = MemoryTokenStore::default();
/// store.set("token", "a.b.c")?;
/// assert_eq!(store.get("token")?.as_deref(), Some("a.b.c"));
/// # Ok::<(), erp_client::domain::ports::TokenStoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    /// Build a store pre-populated with `entries`.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Return the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map still holds consistent string pairs.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        self.lock().remove(key);
        Ok(())
    }
}
