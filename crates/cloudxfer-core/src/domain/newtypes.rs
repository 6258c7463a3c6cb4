//! Validated newtypes
//!
//! - [`RemotePath`] - an absolute, slash-separated path on the remote service
//! - [`Token`] - an opaque, non-empty authentication token

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemotePath
// ============================================================================

/// Absolute path on the remote storage service
///
/// Format: starts with `/`, no empty or `..` components. The root is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a new RemotePath
    ///
    /// A single trailing slash is tolerated and stripped (`/Backups/` becomes
    /// `/Backups`).
    ///
    /// # Errors
    /// Returns error if the path is relative, has empty components or
    /// contains a `..` component
    pub fn new(path: String) -> Result<Self, DomainError> {
        if !path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must start with '/': {path}"
            )));
        }

        let trimmed = if path.len() > 1 && path.ends_with('/') {
            &path[..path.len() - 1]
        } else {
            path.as_str()
        };

        if trimmed.len() > 1 {
            for component in trimmed[1..].split('/') {
                if component.is_empty() {
                    return Err(DomainError::InvalidRemotePath(format!(
                        "Remote path contains invalid double slashes: {path}"
                    )));
                }
                if component == ".." || component == "." {
                    return Err(DomainError::InvalidRemotePath(format!(
                        "Remote path contains invalid traversal: {path}"
                    )));
                }
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Create the root path "/"
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for "/"
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Join a single path component
    ///
    /// # Errors
    /// Returns error if component is empty, contains '/' or is a traversal
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        if component.is_empty() || component.contains('/') || component == ".." {
            return Err(DomainError::InvalidRemotePath(format!(
                "Invalid path component: {component}"
            )));
        }

        let new_path = if self.is_root() {
            format!("/{component}")
        } else {
            format!("{}/{component}", self.0)
        };

        Self::new(new_path)
    }

    /// Join a relative, slash-separated path (e.g. `photos/2024/a.jpg`)
    ///
    /// # Errors
    /// Returns error if any component is invalid
    pub fn join_relative(&self, relative: &str) -> Result<Self, DomainError> {
        relative
            .split('/')
            .filter(|c| !c.is_empty())
            .try_fold(self.clone(), |acc, component| acc.join(component))
    }

    /// Get the parent path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Get the file name component
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }

        self.0.rsplit('/').next()
    }

    /// Number of components below the root ("/" is 0, "/a/b" is 2)
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }

    /// Iterates over every ancestor from the outermost folder to the parent,
    /// excluding the root. `/a/b/c` yields `/a`, `/a/b`.
    pub fn ancestors(&self) -> Vec<RemotePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(p) = current {
            if p.is_root() {
                break;
            }
            current = p.parent();
            out.push(p);
        }
        out.reverse();
        out
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

// ============================================================================
// Token
// ============================================================================

/// Opaque authentication token for the remote API
///
/// The `Debug` implementation redacts the value so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Create a new Token
    ///
    /// # Errors
    /// Returns error if the token is empty or contains whitespace
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        if token.is_empty() {
            return Err(DomainError::InvalidToken("token cannot be empty".into()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidToken(
                "token cannot contain whitespace".into(),
            ));
        }
        Ok(Self(token))
    }

    /// Get the raw token value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl TryFrom<String> for Token {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}
