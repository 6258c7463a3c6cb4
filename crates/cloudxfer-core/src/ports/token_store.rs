//! Credential storage port
//!
//! The engine only needs a valid token before a batch starts; where it is
//! kept (OS keyring, cache file, environment) is the adapter's business.

use crate::domain::newtypes::Token;

/// Port trait for loading and saving the authentication token
///
/// Uses `anyhow::Result` because storage failures are adapter-specific and
/// are only ever reported, never matched on.
pub trait ITokenStore: Send + Sync {
    /// Returns the stored token, or `None` if nothing is stored
    fn load_token(&self) -> anyhow::Result<Option<Token>>;

    /// Persists the token, replacing any previous one
    fn save_token(&self, token: &Token) -> anyhow::Result<()>;

    /// Removes the stored token; succeeds if nothing was stored
    fn clear_token(&self) -> anyhow::Result<()>;
}
