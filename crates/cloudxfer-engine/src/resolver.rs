//! Duplicate resolution
//!
//! Decides, per item and before any bytes move, what to do when the
//! destination already holds a same-named file.
//!
//! | Mode | Destination free | Destination taken |
//! |------|------------------|-------------------|
//! | `Rename` | `Proceed` | `ProceedWithRename` |
//! | `Overwrite` | `Proceed` | `Proceed` (replace in place) |
//! | `Skip` | `Proceed` | `Skip(reason)` |
//!
//! In `Skip` mode a same-named file is always skipped, even when sizes
//! differ; the comparison only picks the reason string.
//!
//! For uploads in `Rename` mode the service renames on collision, so no
//! listing is needed and the answer is always `ProceedWithRename`.

use std::path::Path;

use chrono::{DateTime, Utc};
use cloudxfer_core::domain::{
    DuplicateMode, LocalFileInfo, RemoteEntry, RemotePath, TransferItem,
};
use cloudxfer_core::ports::IRemoteStorage;
use tracing::{debug, warn};

/// Maximum mtime difference for two same-sized files to count as identical
pub const MTIME_TOLERANCE_SECS: i64 = 2;

/// Outcome of a duplicate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Transfer to the requested destination
    Proceed,
    /// Do not transfer; the string explains why
    Skip(String),
    /// Transfer, letting the new copy take a different name on collision
    ProceedWithRename,
}

/// Size and mtime of one side of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFacts {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl From<&LocalFileInfo> for FileFacts {
    fn from(info: &LocalFileInfo) -> Self {
        Self {
            size: info.size,
            modified: info.modified,
        }
    }
}

impl From<&RemoteEntry> for FileFacts {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            size: entry.size,
            modified: entry.modified,
        }
    }
}

/// Applies a [`DuplicateMode`] to metadata snapshots
#[derive(Debug, Clone, Copy)]
pub struct DuplicateResolver {
    mode: DuplicateMode,
}

impl DuplicateResolver {
    pub fn new(mode: DuplicateMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DuplicateMode {
        self.mode
    }

    /// Pure decision from already fetched metadata
    ///
    /// `remote` is `None` when the remote side is unknown (download
    /// direction only). `destination_exists` says whether the target is
    /// occupied.
    pub fn resolve(
        &self,
        local: Option<FileFacts>,
        remote: Option<FileFacts>,
        destination_exists: bool,
    ) -> Resolution {
        if !destination_exists {
            return Resolution::Proceed;
        }
        match self.mode {
            DuplicateMode::Rename => Resolution::ProceedWithRename,
            DuplicateMode::Overwrite => Resolution::Proceed,
            DuplicateMode::Skip => Resolution::Skip(skip_reason(local, remote)),
        }
    }

    /// Upload direction: looks the name up in one listing of the
    /// destination folder
    ///
    /// A failed listing counts as "no remote file"; the upload itself will
    /// surface any real problem with the folder.
    pub async fn resolve_upload(
        &self,
        storage: &dyn IRemoteStorage,
        item: &TransferItem,
        local: &LocalFileInfo,
    ) -> Resolution {
        match self.mode {
            DuplicateMode::Rename => return Resolution::ProceedWithRename,
            DuplicateMode::Overwrite => return Resolution::Proceed,
            DuplicateMode::Skip => {}
        }

        let existing = find_file(storage, &item.remote_folder(), item.remote_name()).await;
        self.resolve(
            Some(FileFacts::from(local)),
            existing.as_ref().map(FileFacts::from),
            existing.is_some(),
        )
    }

    /// Download direction: driven by the local target's existence
    ///
    /// The remote parent is listed only when the mode is `Skip` and the
    /// local file exists, to refine the skip reason.
    pub async fn resolve_download(
        &self,
        storage: &dyn IRemoteStorage,
        item: &TransferItem,
    ) -> Resolution {
        let Some(local) = local_info(&item.local_path).await else {
            return Resolution::Proceed;
        };
        if self.mode != DuplicateMode::Skip {
            return self.resolve(Some(FileFacts::from(&local)), None, true);
        }

        let remote = find_file(storage, &item.remote_folder(), item.remote_name()).await;
        self.resolve(
            Some(FileFacts::from(&local)),
            remote.as_ref().map(FileFacts::from),
            true,
        )
    }
}

/// Builds the skip reason for an occupied destination
fn skip_reason(local: Option<FileFacts>, remote: Option<FileFacts>) -> String {
    match (local, remote) {
        (Some(local), Some(remote)) if local.size != remote.size => format!(
            "exists but different size (local: {}, remote: {})",
            local.size, remote.size
        ),
        (Some(local), Some(remote)) if mtimes_close(local.modified, remote.modified) => {
            format!("identical (size: {} bytes, similar timestamps)", local.size)
        }
        (Some(local), Some(_)) => {
            format!("likely identical (same size: {} bytes)", local.size)
        }
        (Some(local), None) => format!("already exists locally (size: {} bytes)", local.size),
        (None, _) => "already exists".to_string(),
    }
}

fn mtimes_close(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).num_seconds().abs() <= MTIME_TOLERANCE_SECS,
        _ => false,
    }
}

/// Finds a non-folder entry by exact name
async fn find_file(
    storage: &dyn IRemoteStorage,
    folder: &RemotePath,
    name: &str,
) -> Option<RemoteEntry> {
    match storage.list_folder(folder).await {
        Ok(entries) => entries
            .into_iter()
            .find(|e| !e.is_folder && e.name == name),
        Err(e) => {
            warn!(folder = %folder, error = %e, "Could not list destination folder");
            None
        }
    }
}

async fn local_info(path: &Path) -> Option<LocalFileInfo> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Some(LocalFileInfo::from_metadata(&meta)),
        Ok(_) => None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Local target not present");
            None
        }
    }
}
