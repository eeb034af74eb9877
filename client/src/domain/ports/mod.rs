//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod session_expired_handler;
mod token_store;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    ApiRequest, FixtureHttpTransport, FormPart, HttpMethod, HttpTransport, MultipartForm,
    RequestBody, TransportError, TransportResponse,
};
#[cfg(test)]
pub use session_expired_handler::MockSessionExpiredHandler;
pub use session_expired_handler::{
    NoopSessionExpiredHandler, SessionExpiredHandler, is_sign_in_path,
};
#[cfg(test)]
pub use token_store::MockTokenStore;
pub use token_store::{MemoryTokenStore, TokenStore, TokenStoreError};
