//! Session storage layout.
//!
//! Five keys make up a stored session. `authToken` and `userRole` are legacy
//! aliases of `token` and `role`: reads fall back to them, writes go to the
//! primary keys only, and [`migrate_legacy`] folds them into the primary
//! keys once.

use tracing::{info, warn};

use super::SessionToken;
use super::ports::{TokenStore, TokenStoreError};

/// Primary bearer token key.
pub const TOKEN_KEY: &str = "token";
/// Legacy bearer token key, read as a fallback.
pub const LEGACY_TOKEN_KEY: &str = "authToken";
/// JSON-serialised user object.
pub const USER_DATA_KEY: &str = "userData";
/// Primary role key.
pub const ROLE_KEY: &str = "role";
/// Legacy role key, read as a fallback.
pub const LEGACY_ROLE_KEY: &str = "userRole";

/// Every key cleared when the session ends.
pub const SESSION_KEYS: [&str; 5] = [
    TOKEN_KEY,
    LEGACY_TOKEN_KEY,
    USER_DATA_KEY,
    ROLE_KEY,
    LEGACY_ROLE_KEY,
];

/// Outcome of [`migrate_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `authToken` was copied into `token`.
    pub token_migrated: bool,
    /// `userRole` was copied into `role`.
    pub role_migrated: bool,
}

/// Read the bearer token, preferring the primary key.
///
/// Empty values count as absent so a blank primary key still falls back to
/// the legacy key.
///
/// # Errors
///
/// Propagates storage failures.
pub fn read_token(store: &dyn TokenStore) -> Result<Option<SessionToken>, TokenStoreError> {
    Ok(read_with_fallback(store, TOKEN_KEY, LEGACY_TOKEN_KEY)?.map(SessionToken::new))
}

/// Read the stored role name, preferring the primary key.
///
/// # Errors
///
/// Propagates storage failures.
pub fn read_role(store: &dyn TokenStore) -> Result<Option<String>, TokenStoreError> {
    read_with_fallback(store, ROLE_KEY, LEGACY_ROLE_KEY)
}

fn read_with_fallback(
    store: &dyn TokenStore,
    primary: &str,
    legacy: &str,
) -> Result<Option<String>, TokenStoreError> {
    if let Some(value) = non_empty(store.get(primary)?) {
        return Ok(Some(value));
    }
    Ok(non_empty(store.get(legacy)?))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Remove both token keys, leaving the rest of the session in place.
///
/// # Errors
///
/// Returns the first storage failure after attempting both removals.
pub fn clear_tokens(store: &dyn TokenStore) -> Result<(), TokenStoreError> {
    remove_all(store, &[TOKEN_KEY, LEGACY_TOKEN_KEY])
}

/// Remove every session key.
///
/// # Errors
///
/// Returns the first storage failure after attempting every removal.
pub fn clear_session(store: &dyn TokenStore) -> Result<(), TokenStoreError> {
    remove_all(store, &SESSION_KEYS)
}

fn remove_all(store: &dyn TokenStore, keys: &[&str]) -> Result<(), TokenStoreError> {
    let mut first_error = None;
    for key in keys {
        if let Err(error) = store.remove(key) {
            warn!(key, error = %error, "failed to remove session key");
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Fold the legacy aliases into the primary keys.
///
/// A legacy value is copied only when the primary key is empty; legacy keys
/// are removed in every case so later reads see a single source.
///
/// # Errors
///
/// Propagates storage failures.
///
/// # Examples
/// ```
/// use erp_client::domain::ports::{MemoryTokenStore, TokenStore};
/// use erp_client::domain::session_keys::{migrate_legacy, TOKEN_KEY};
///
/// let store = MemoryTokenStore::with_entries([("authToken", "a.b.c")]);
/// let report = migrate_legacy(&store)?;
/// assert!(report.token_migrated);
/// assert_eq!(store.get(TOKEN_KEY)?.as_deref(), Some("a.b.c"));
/// assert_eq!(store.get("authToken")?, None);
/// # Ok::<(), erp_client::domain::ports::TokenStoreError>(())
/// ```
pub fn migrate_legacy(store: &dyn TokenStore) -> Result<MigrationReport, TokenStoreError> {
    let report = MigrationReport {
        token_migrated: migrate_key(store, LEGACY_TOKEN_KEY, TOKEN_KEY)?,
        role_migrated: migrate_key(store, LEGACY_ROLE_KEY, ROLE_KEY)?,
    };
    if report.token_migrated || report.role_migrated {
        info!(
            token_migrated = report.token_migrated,
            role_migrated = report.role_migrated,
            "migrated legacy session keys"
        );
    }
    Ok(report)
}

fn migrate_key(store: &dyn TokenStore, legacy: &str, primary: &str) -> Result<bool, TokenStoreError> {
    let Some(value) = non_empty(store.get(legacy)?) else {
        store.remove(legacy)?;
        return Ok(false);
    };
    let migrated = if non_empty(store.get(primary)?).is_none() {
        store.set(primary, &value)?;
        true
    } else {
        false
    };
    store.remove(legacy)?;
    Ok(migrated)
}
