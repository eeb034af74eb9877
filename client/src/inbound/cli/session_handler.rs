//! Session-expired handler for terminal hosts.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::domain::ports::SessionExpiredHandler;

/// Records that the session expired so the binary can print a sign-in hint.
///
/// Terminals have no current page, so every rejection counts as a redirect.
#[derive(Debug, Default)]
pub struct TerminalSessionExpiredHandler {
    expired: AtomicBool,
}

impl TerminalSessionExpiredHandler {
    /// Whether a redirect was requested since construction.
    #[must_use]
    pub fn session_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }
}

impl SessionExpiredHandler for TerminalSessionExpiredHandler {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn redirect_to_sign_in(&self, route: &str) {
        warn!(route, "session expired; sign in again and run `erp-client session set`");
        self.expired.store(true, Ordering::Release);
    }
}
