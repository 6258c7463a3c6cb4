//! File metadata snapshots
//!
//! [`RemoteEntry`] comes from a remote folder listing and may already be stale
//! when a transfer runs. [`LocalFileInfo`] is the equivalent snapshot of a
//! local file. Both are plain values; nothing here performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a remote folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub is_folder: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Service-computed content hash; its algorithm is proprietary, so it is
    /// carried along but never compared against local content.
    pub hash: Option<u64>,
}

impl RemoteEntry {
    /// Convenience constructor for a file entry
    pub fn file(name: impl Into<String>, size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            size,
            modified,
            hash: None,
        }
    }

    /// Convenience constructor for a folder entry
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
            size: 0,
            modified: None,
            hash: None,
        }
    }
}

/// Snapshot of a local file's size and modification time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileInfo {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl LocalFileInfo {
    pub fn new(size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self { size, modified }
    }

    /// Builds a snapshot from filesystem metadata already fetched by the caller
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// Account quota information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub email: String,
    pub quota: u64,
    pub used_quota: u64,
    pub premium: bool,
}

impl AccountInfo {
    /// Bytes still available
    pub fn available(&self) -> u64 {
        self.quota.saturating_sub(self.used_quota)
    }

    /// Used quota as a percentage (0 when the quota is unknown)
    pub fn usage_percent(&self) -> f64 {
        if self.quota == 0 {
            0.0
        } else {
            (self.used_quota as f64 / self.quota as f64) * 100.0
        }
    }
}
