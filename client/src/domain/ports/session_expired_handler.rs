//! Driven port notified when the backend rejects the session.
//!
//! Browsers redirect to the sign-in page, terminals print a hint, tests
//! record the call. The client only decides *whether* to redirect; the host
//! decides what redirecting means.

/// Host callback invoked after the stored session was cleared.
#[cfg_attr(test, mockall::automock)]
pub trait SessionExpiredHandler: Send + Sync {
    /// Path the host currently displays, if it has a notion of location.
    ///
    /// Returning a path under the sign-in route suppresses the redirect so a
    /// failing call on the sign-in page does not loop.
    fn current_path(&self) -> Option<String>;

    /// Send the user to the sign-in route.
    fn redirect_to_sign_in(&self, route: &str);
}

/// Handler that ignores session expiry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionExpiredHandler;

impl SessionExpiredHandler for NoopSessionExpiredHandler {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn redirect_to_sign_in(&self, _route: &str) {}
}

/// Return whether `path` already belongs to the sign-in flow.
///
/// # Examples
/// ```
/// use erp_client::domain::ports::is_sign_in_path;
///
/// assert!(is_sign_in_path("/auth/otp", "/auth"));
/// assert!(is_sign_in_path("/school/login", "/auth"));
/// assert!(!is_sign_in_path("/students", "/auth"));
/// ```
#[must_use]
pub fn is_sign_in_path(path: &str, sign_in_route: &str) -> bool {
    let route = sign_in_route.trim_end_matches('/');
    let on_route = !route.is_empty()
        && path
            .strip_prefix(route)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'));
    on_route || path.contains("/auth") || path.contains("/login")
}
