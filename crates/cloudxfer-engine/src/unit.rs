//! Single-file transfer
//!
//! [`StreamTransferUnit::transfer_one`] moves one file and always returns a
//! [`TransferOutcome`]; errors never escape it. Per file:
//!
//! ```text
//! Pending -> ResolvingDuplicate -> Skipped
//!                               -> Streaming -> Succeeded | Failed
//! ```
//!
//! Bytes are streamed in chunks of at most `chunk_size` (8 KiB by default),
//! so no file is ever held in memory whole. Every chunk is reported to the
//! [`ProgressTracker`]. A failed transfer leaves any partial destination
//! file in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cloudxfer_core::config::TransferConfig;
use cloudxfer_core::domain::{
    Direction, LocalFileInfo, RemoteError, TransferItem, TransferOutcome,
};
use cloudxfer_core::ports::{ByteStream, IRemoteStorage, UploadOptions, UploadSource};
use futures_util::{StreamExt, TryStreamExt};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::namer::UniqueNamer;
use crate::progress::ProgressTracker;
use crate::resolver::{DuplicateResolver, Resolution};

/// Default streaming buffer size
pub const CHUNK_SIZE: usize = 8 * 1024;

fn local_error(path: &Path, error: std::io::Error) -> RemoteError {
    RemoteError::LocalIo(format!("{}: {error}", path.display()))
}

// ============================================================================
// FileUploadSource
// ============================================================================

/// Local file opened afresh for every upload attempt
///
/// Progress is reported against a per-file high-water mark: bytes re-sent by
/// a retry are not counted again.
struct FileUploadSource {
    path: PathBuf,
    size: u64,
    chunk_size: usize,
    tracker: Arc<ProgressTracker>,
    reported: Arc<AtomicU64>,
}

#[async_trait]
impl UploadSource for FileUploadSource {
    async fn open(&self) -> std::io::Result<ByteStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        let tracker = Arc::clone(&self.tracker);
        let reported = Arc::clone(&self.reported);
        let mut sent: u64 = 0;

        let stream = ReaderStream::with_capacity(file, self.chunk_size).inspect_ok(move |chunk| {
            sent += chunk.len() as u64;
            let previous = reported.fetch_max(sent, Ordering::SeqCst);
            if sent > previous {
                tracker.add_transferred(sent - previous);
            }
        });
        Ok(Box::pin(stream))
    }

    fn size(&self) -> u64 {
        self.size
    }
}

// ============================================================================
// StreamTransferUnit
// ============================================================================

/// Performs one file's upload or download
pub struct StreamTransferUnit {
    storage: Arc<dyn IRemoteStorage>,
    tracker: Arc<ProgressTracker>,
    resolver: DuplicateResolver,
    config: TransferConfig,
}

impl StreamTransferUnit {
    pub fn new(
        storage: Arc<dyn IRemoteStorage>,
        tracker: Arc<ProgressTracker>,
        config: TransferConfig,
    ) -> Self {
        Self {
            storage,
            tracker,
            resolver: DuplicateResolver::new(config.duplicate_mode),
            config,
        }
    }

    /// Transfers `item` and marks it completed on the tracker
    pub async fn transfer_one(&self, item: &TransferItem) -> TransferOutcome {
        debug!(file = %item.display_name(), direction = ?item.direction, "Resolving duplicate policy");

        let result = match item.direction {
            Direction::Upload => self.upload(item).await,
            Direction::Download => self.download(item).await,
        };
        let outcome = result.unwrap_or_else(|e| TransferOutcome::Failed(e.to_string()));

        self.tracker.complete_one();
        outcome
    }

    async fn upload(&self, item: &TransferItem) -> Result<TransferOutcome, RemoteError> {
        let path = &item.local_path;

        // Local problems surface before any network call
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| local_error(path, e))?;
        if !metadata.is_file() {
            return Err(RemoteError::LocalIo(format!(
                "{}: not a regular file",
                path.display()
            )));
        }
        drop(
            tokio::fs::File::open(path)
                .await
                .map_err(|e| local_error(path, e))?,
        );
        let local = LocalFileInfo::from_metadata(&metadata);

        if let Resolution::Skip(reason) = self
            .resolver
            .resolve_upload(self.storage.as_ref(), item, &local)
            .await
        {
            return Ok(TransferOutcome::Skipped(reason));
        }

        debug!(file = %item.display_name(), size = local.size, "Streaming upload");
        let source = FileUploadSource {
            path: path.clone(),
            size: local.size,
            chunk_size: self.config.chunk_size,
            tracker: Arc::clone(&self.tracker),
            reported: Arc::new(AtomicU64::new(0)),
        };
        self.storage
            .upload_stream(
                &item.remote_folder(),
                item.remote_name(),
                &source,
                UploadOptions::for_mode(self.config.duplicate_mode),
            )
            .await?;

        Ok(TransferOutcome::Uploaded)
    }

    async fn download(&self, item: &TransferItem) -> Result<TransferOutcome, RemoteError> {
        let target = match self
            .resolver
            .resolve_download(self.storage.as_ref(), item)
            .await
        {
            Resolution::Skip(reason) => return Ok(TransferOutcome::Skipped(reason)),
            Resolution::Proceed => item.local_path.clone(),
            Resolution::ProceedWithRename => {
                let renamed = UniqueNamer::unique_local_path(&item.local_path);
                info!(
                    original = %item.local_path.display(),
                    renamed = %renamed.display(),
                    "Local file exists, downloading under a new name"
                );
                renamed
            }
        };

        let url = self.storage.get_download_link(&item.remote_path).await?;
        let download = self.storage.open_download(&url).await?;
        if let Some(length) = download.content_length {
            self.tracker.add_expected(length);
        }

        debug!(file = %item.display_name(), target = %target.display(), "Streaming download");
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| local_error(parent, e))?;
        }
        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(|e| local_error(&target, e))?;

        let mut body = download.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                RemoteError::Transient(format!("download of {} interrupted: {e}", item.remote_path))
            })?;
            for piece in chunk.chunks(self.config.chunk_size) {
                file.write_all(piece)
                    .await
                    .map_err(|e| local_error(&target, e))?;
                self.tracker.add_transferred(piece.len() as u64);
            }
        }
        file.flush().await.map_err(|e| local_error(&target, e))?;

        Ok(TransferOutcome::Downloaded)
    }
}
