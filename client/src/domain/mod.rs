//! Domain layer: the authenticated API client, its error taxonomy and the
//! session model.
//!
//! Purpose: keep request semantics independent of the HTTP library and the
//! storage backend. Outbound adapters implement the traits in [`ports`];
//! inbound adapters drive [`ApiClient`].

pub mod api_client;
pub mod error;
pub mod ports;
pub mod session_keys;
pub mod session_token;

pub use self::api_client::{ApiClient, ApiResult, DEFAULT_SIGN_IN_ROUTE};
pub use self::error::{ApiError, ErrorCode};
pub use self::session_keys::MigrationReport;
pub use self::session_token::{SessionClaims, SessionToken, TokenDecodeError};
pub use envelope::{Envelope, Pagination};
