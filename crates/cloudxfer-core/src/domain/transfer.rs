//! Transfer items, outcomes and batch-level policy types

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RemotePath;

/// Base URL of the US API region
pub const API_US: &str = "https://api.pcloud.com";

/// Base URL of the EU API region
pub const API_EU: &str = "https://eapi.pcloud.com";

// ============================================================================
// Region
// ============================================================================

/// API region, selecting the base URL of the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    /// Base URL for API calls in this region
    pub fn endpoint(&self) -> &'static str {
        match self {
            Region::Us => API_US,
            Region::Eu => API_EU,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(DomainError::InvalidValue(format!(
                "unknown region '{other}'; valid: us, eu"
            ))),
        }
    }
}

// ============================================================================
// DuplicateMode
// ============================================================================

/// What to do when the destination already holds a same-named file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateMode {
    /// Leave the existing file alone and report the item as skipped
    Skip,
    /// Replace the existing file in place
    Overwrite,
    /// Keep both; the new copy gets a different name
    #[default]
    Rename,
}

impl DuplicateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateMode::Skip => "skip",
            DuplicateMode::Overwrite => "overwrite",
            DuplicateMode::Rename => "rename",
        }
    }
}

impl Display for DuplicateMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicateMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(DuplicateMode::Skip),
            "overwrite" => Ok(DuplicateMode::Overwrite),
            "rename" => Ok(DuplicateMode::Rename),
            other => Err(DomainError::InvalidValue(format!(
                "unknown duplicate mode '{other}'; valid: skip, overwrite, rename"
            ))),
        }
    }
}

// ============================================================================
// TransferItem
// ============================================================================

/// Direction of a single transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upload,
    Download,
}

/// One file scheduled for transfer
///
/// `remote_path` is always the full path of the remote file; for uploads its
/// parent is the destination folder and its name the uploaded file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferItem {
    pub local_path: PathBuf,
    pub remote_path: RemotePath,
    pub direction: Direction,
}

impl TransferItem {
    /// Builds an upload of `local_path` into `remote_folder`, keeping the
    /// local file name.
    ///
    /// # Errors
    /// Returns error if the local path has no UTF-8 file name
    pub fn upload(local_path: impl Into<PathBuf>, remote_folder: &RemotePath) -> Result<Self, DomainError> {
        let local_path = local_path.into();
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DomainError::InvalidRemotePath(format!(
                    "local path has no usable file name: {}",
                    local_path.display()
                ))
            })?;
        let remote_path = remote_folder.join(name)?;
        Ok(Self {
            local_path,
            remote_path,
            direction: Direction::Upload,
        })
    }

    /// Builds a download of `remote_path` to exactly `local_path`.
    pub fn download(remote_path: RemotePath, local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path,
            direction: Direction::Download,
        }
    }

    /// File name used on the remote side
    pub fn remote_name(&self) -> &str {
        self.remote_path.file_name().unwrap_or_default()
    }

    /// Folder holding the remote file
    pub fn remote_folder(&self) -> RemotePath {
        self.remote_path.parent().unwrap_or_else(RemotePath::root)
    }

    /// Short label for logs and progress lines
    pub fn display_name(&self) -> String {
        match self.direction {
            Direction::Upload => file_label(&self.local_path),
            Direction::Download => self.remote_name().to_string(),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// TransferOutcome
// ============================================================================

/// Terminal classification of one file's transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Uploaded,
    Downloaded,
    /// Not transferred because of the duplicate policy; not an error
    Skipped(String),
    Failed(String),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Uploaded | TransferOutcome::Downloaded)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TransferOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TransferOutcome::Failed(_))
    }
}

impl Display for TransferOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TransferOutcome::Uploaded => f.write_str("uploaded"),
            TransferOutcome::Downloaded => f.write_str("downloaded"),
            TransferOutcome::Skipped(reason) => write!(f, "skipped: {reason}"),
            TransferOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// BatchSummary
// ============================================================================

/// Aggregate `(succeeded, skipped, failed)` counts of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BatchSummary {
    /// Folds one outcome into the counts
    pub fn record(&mut self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Uploaded | TransferOutcome::Downloaded => self.succeeded += 1,
            TransferOutcome::Skipped(_) => self.skipped += 1,
            TransferOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.succeeded + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn as_tuple(&self) -> (u32, u32, u32) {
        (self.succeeded, self.skipped, self.failed)
    }
}
