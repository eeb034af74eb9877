//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed [`crate::domain::ports::HttpTransport`]
//! - **storage**: file-backed [`crate::domain::ports::TokenStore`]
//!
//! Adapters translate between domain types and library types. They contain
//! no request classification or session logic.

pub mod http;
pub mod storage;
