//! cloudxfer API - HTTP adapter for the remote storage service
//!
//! Provides:
//! - A retrying, connection-pooled transport with per-request timeouts
//! - A typed client implementing the `IRemoteStorage` port
//! - Token persistence in the OS keyring with a file fallback
//!
//! ## Modules
//!
//! - [`transport`] - Retry policy, backoff and transient-failure classification
//! - [`client`] - Typed API client (listing, links, streaming upload/download)
//! - [`auth`] - Login token storage (keyring and JSON file)

pub mod auth;
pub mod client;
pub mod transport;

pub use auth::{FileTokenStore, KeyringTokenStore};
pub use client::ApiClient;
pub use transport::{RetryPolicy, RetryingTransport, TransportSettings};
