//! Session storage adapters.

mod atomic_io;
mod file_token_store;

pub use file_token_store::FileTokenStore;
