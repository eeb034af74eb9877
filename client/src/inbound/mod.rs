//! Inbound adapters that translate external input into [`crate::domain::ApiClient`]
//! calls while keeping argument parsing at the edge.

pub mod cli;
