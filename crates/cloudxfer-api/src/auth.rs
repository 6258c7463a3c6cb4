//! Session token persistence
//!
//! ## Components
//!
//! - [`KeyringTokenStore`] - Stores the token in the OS credential store,
//!   falling back to a JSON file when no keyring is reachable
//! - [`FileTokenStore`] - JSON file store (mode 0600 on Unix)
//!
//! Tokens are kept per API region: a token issued by one region is not
//! valid against the other.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cloudxfer_core::domain::{Region, Token};
use cloudxfer_core::ports::ITokenStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Keyring service name for storing tokens
const KEYRING_SERVICE: &str = "cloudxfer";

// ============================================================================
// FileTokenStore
// ============================================================================

/// On-disk layout of the token cache file
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    auth_token: String,
    #[serde(default)]
    region: Option<Region>,
}

/// Stores the token in a JSON file readable only by the owner
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    region: Region,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>, region: Region) -> Self {
        Self {
            path: path.into(),
            region,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn restrict_permissions(&self) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl ITokenStore for FileTokenStore {
    fn load_token(&self) -> Result<Option<Token>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read token cache {}", self.path.display())))
            }
        };

        let cached: CachedToken = serde_json::from_str(&content)
            .with_context(|| format!("Token cache {} is corrupted", self.path.display()))?;

        if cached.region.is_some_and(|r| r != self.region) {
            debug!(
                cached = ?cached.region,
                wanted = %self.region,
                "Cached token belongs to another region"
            );
            return Ok(None);
        }

        let token = Token::new(cached.auth_token).context("Token cache holds an empty token")?;
        Ok(Some(token))
    }

    fn save_token(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let cached = CachedToken {
            auth_token: token.expose().to_string(),
            region: Some(self.region),
        };
        let json = serde_json::to_string(&cached).context("Failed to serialize token")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write token cache {}", self.path.display()))?;
        self.restrict_permissions()?;

        debug!(path = %self.path.display(), "Stored token in file cache");
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed token cache file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to remove token cache {}", self.path.display()))),
        }
    }
}

// ============================================================================
// KeyringTokenStore
// ============================================================================

/// Stores the token in the system keyring, with a file fallback
///
/// Uses the `keyring` crate (GNOME Keyring, KDE Wallet, macOS Keychain).
/// The keyring entry is `cloudxfer` / `<region>_auth_token`. A token found
/// only in the fallback file is moved into the keyring on load.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    region: Region,
    fallback: FileTokenStore,
}

impl KeyringTokenStore {
    pub fn new(region: Region, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            region,
            fallback: FileTokenStore::new(cache_file, region),
        }
    }

    fn username(&self) -> String {
        format!("{}_auth_token", self.region)
    }

    fn entry(&self) -> keyring::Result<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.username())
    }

    /// Moves a file-cached token into the keyring
    fn migrate(&self, token: &Token) {
        let stored = self
            .entry()
            .and_then(|entry| entry.set_password(token.expose()));
        match stored {
            Ok(()) => {
                if let Err(e) = self.fallback.clear_token() {
                    warn!(error = %e, "Token migrated but cache file could not be removed");
                } else {
                    info!("Migrated token to keyring storage");
                }
            }
            Err(e) => debug!(error = %e, "Keyring unavailable; keeping file cache"),
        }
    }
}

impl ITokenStore for KeyringTokenStore {
    fn load_token(&self) -> Result<Option<Token>> {
        match self.entry().and_then(|entry| entry.get_password()) {
            Ok(secret) => {
                debug!(region = %self.region, "Loaded token from keyring");
                return Ok(Some(Token::new(secret).context("Keyring holds an empty token")?));
            }
            Err(keyring::Error::NoEntry) => {
                debug!(region = %self.region, "No token in keyring");
            }
            Err(e) => {
                warn!(error = %e, "Could not read keyring, trying file cache");
            }
        }

        let token = self.fallback.load_token()?;
        if let Some(ref token) = token {
            self.migrate(token);
        }
        Ok(token)
    }

    fn save_token(&self, token: &Token) -> Result<()> {
        match self
            .entry()
            .and_then(|entry| entry.set_password(token.expose()))
        {
            Ok(()) => {
                debug!(region = %self.region, "Stored token in keyring");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not save token to keyring, using file fallback");
                self.fallback.save_token(token)
            }
        }
    }

    fn clear_token(&self) -> Result<()> {
        match self.entry().and_then(|entry| entry.delete_credential()) {
            Ok(()) => info!(region = %self.region, "Cleared token from keyring"),
            Err(keyring::Error::NoEntry) => debug!("No keyring token to clear"),
            Err(e) => warn!(error = %e, "Could not clear keyring entry"),
        }
        self.fallback.clear_token()
    }
}
