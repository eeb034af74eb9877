//! Normalised failure record surfaced by every API call.
//!
//! The client translates transport outcomes into [`ApiError`] so feature code
//! branches on [`ErrorCode`] or the HTTP status instead of on error types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable machine-readable code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The backend rejected the credentials; the session was cleared.
    AuthFailed,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The backend failed with a 5xx status.
    ServerError,
    /// Any other non-success status carrying a response.
    ApiError,
    /// The request was sent but no response arrived.
    NetworkError,
    /// The request could not be prepared or the response could not be read.
    UnknownError,
}

impl ErrorCode {
    /// Wire representation of the code.
    ///
    /// # Examples
    /// ```
    /// use erp_client::domain::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::AuthFailed.as_str(), "AUTH_FAILED");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthFailed => "AUTH_FAILED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::ServerError => "SERVER_ERROR",
            Self::ApiError => "API_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    const fn default_message(self) -> &'static str {
        match self {
            Self::AuthFailed => "Your session has expired. Please sign in again.",
            Self::Forbidden => "You do not have permission to perform this action.",
            Self::NotFound => "The requested resource was not found.",
            Self::ServerError => "The server encountered an error. Please try again later.",
            Self::ApiError => "The request could not be completed.",
            Self::NetworkError => "Unable to reach the server. Please check your connection.",
            Self::UnknownError => "An unexpected error occurred.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by [`crate::domain::ApiClient`].
///
/// ## Invariants
/// - `message` is never blank; blank inputs fall back to a per-code message.
/// - Only the client's failure translation constructs values.
///
/// Serialises as `{"message": "...", "status": 403, "code": "FORBIDDEN"}`
/// with `status` omitted when no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    code: ErrorCode,
}

impl ApiError {
    pub(in crate::domain) fn new(
        code: ErrorCode,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.default_message().to_owned()
        } else {
            message
        };
        Self {
            message,
            status,
            code,
        }
    }

    pub(in crate::domain) fn auth_failed() -> Self {
        Self::new(ErrorCode::AuthFailed, Some(401), "")
    }

    pub(in crate::domain) fn forbidden() -> Self {
        Self::new(ErrorCode::Forbidden, Some(403), "")
    }

    pub(in crate::domain) fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, Some(404), "")
    }

    pub(in crate::domain) fn server_error(status: u16) -> Self {
        Self::new(ErrorCode::ServerError, Some(status), "")
    }

    pub(in crate::domain) fn api(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiError, Some(status), message)
    }

    pub(in crate::domain) fn network() -> Self {
        Self::new(ErrorCode::NetworkError, None, "")
    }

    pub(in crate::domain) fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError, None, message)
    }

    /// Unknown failure tied to a response that could not be decoded.
    pub(in crate::domain) fn undecodable(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError, Some(status), message)
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// HTTP status of the response, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Human-readable message suitable for display.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Whether the failure cleared the stored session.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.code, ErrorCode::AuthFailed)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests;
