//! Authenticated client for the School ERP REST API.
//!
//! [`domain::ApiClient`] attaches the stored bearer token to every request,
//! unwraps the backend's `{ success, data, ... }` envelope and reports
//! failures as a small, stable [`domain::ApiError`] taxonomy. Storage,
//! transport and the session-expired callback are injected through
//! [`domain::ports`], with production adapters under [`outbound`].

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
