//! Remote storage port (driven/secondary port)
//!
//! The narrow interface the transfer engine uses to talk to the remote
//! object-storage service. The HTTP implementation lives in `cloudxfer-api`;
//! tests use in-memory fakes.
//!
//! ## Design Notes
//!
//! - Errors are the closed [`RemoteError`] set so callers can match on them
//!   instead of probing loosely-typed responses.
//! - Implementations retry transient failures internally; a
//!   `RemoteError::Transient` reaching the caller means the retry budget is spent.
//! - Bodies travel as [`ByteStream`]s so no file is ever buffered whole.
//!   Uploads take an [`UploadSource`] rather than a stream because a retried
//!   request must start again from the first byte.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::domain::errors::RemoteError;
use crate::domain::metadata::{AccountInfo, RemoteEntry};
use crate::domain::newtypes::RemotePath;
use crate::domain::transfer::DuplicateMode;

/// A stream of byte chunks read from a file or a response body
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Identifier the service assigns to a folder
pub type FolderId = u64;

/// An open download: the body stream plus its announced length, if any
pub struct DownloadStream {
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Per-request upload flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Ask the service to pick a new name if the target exists
    pub rename_if_exists: bool,
    /// Ask the service to replace the target in place, never leaving a
    /// partially written object behind
    pub no_partial: bool,
}

impl UploadOptions {
    /// Flags matching a duplicate policy
    pub fn for_mode(mode: DuplicateMode) -> Self {
        match mode {
            DuplicateMode::Rename => Self {
                rename_if_exists: true,
                no_partial: false,
            },
            DuplicateMode::Overwrite => Self {
                rename_if_exists: false,
                no_partial: true,
            },
            DuplicateMode::Skip => Self::default(),
        }
    }
}

/// Re-openable content for an upload
#[async_trait::async_trait]
pub trait UploadSource: Send + Sync {
    /// Opens a fresh stream positioned at the first byte. Called once per
    /// attempt.
    async fn open(&self) -> std::io::Result<ByteStream>;

    /// Content length in bytes, as known when the source was created
    fn size(&self) -> u64;
}

/// Port trait for remote storage operations
#[async_trait::async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Lists the direct children of a folder
    async fn list_folder(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>, RemoteError>;

    /// Creates a folder if it does not exist yet and returns its id
    async fn create_folder(&self, path: &RemotePath) -> Result<FolderId, RemoteError>;

    /// Resolves a file path to a direct download URL
    async fn get_download_link(&self, path: &RemotePath) -> Result<String, RemoteError>;

    /// Starts streaming the content behind a download URL
    async fn open_download(&self, url: &str) -> Result<DownloadStream, RemoteError>;

    /// Uploads `source` as `folder/name`
    async fn upload_stream(
        &self,
        folder: &RemotePath,
        name: &str,
        source: &dyn UploadSource,
        options: UploadOptions,
    ) -> Result<(), RemoteError>;

    /// Retrieves account quota information
    async fn account_info(&self) -> Result<AccountInfo, RemoteError>;
}
