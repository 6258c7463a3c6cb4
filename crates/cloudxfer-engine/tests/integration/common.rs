//! Shared test helpers for engine integration tests
//!
//! [`FakeStorage`] keeps files and folders in memory, mimics the service's
//! rename-on-collision behavior and records the size of every upload chunk
//! it receives.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use cloudxfer_core::config::TransferConfig;
use cloudxfer_core::domain::{AccountInfo, DuplicateMode, RemoteEntry, RemoteError, RemotePath};
use cloudxfer_core::ports::{
    DownloadStream, FolderId, IRemoteStorage, UploadOptions, UploadSource,
};
use futures_util::StreamExt;

const LINK_PREFIX: &str = "fake://";

/// A stored remote file
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct FakeStorage {
    files: Mutex<BTreeMap<String, StoredFile>>,
    folders: Mutex<BTreeSet<String>>,
    unlistable: Mutex<BTreeSet<String>>,
    created: Mutex<Vec<String>>,
    upload_chunks: Mutex<Vec<usize>>,
    uploads: AtomicU32,
    listings: AtomicU32,
    /// Size of the chunks served by downloads
    download_chunk: usize,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self {
            download_chunk: 20_000,
            ..Self::default()
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.folders.lock().unwrap().insert(path.to_string());
        self
    }

    pub fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.files.lock().unwrap().insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                modified: Some(Utc::now()),
            },
        );
        self
    }

    /// Makes `list_folder` fail for `path`
    pub fn with_unlistable(self, path: &str) -> Self {
        self.unlistable.lock().unwrap().insert(path.to_string());
        self
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|f| f.content.clone())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn created_folders(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn upload_chunks(&self) -> Vec<usize> {
        self.upload_chunks.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn listing_count(&self) -> u32 {
        self.listings.load(Ordering::SeqCst)
    }

    fn folder_exists(&self, path: &str) -> bool {
        path == "/" || self.folders.lock().unwrap().contains(path)
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn join(folder: &str, name: &str) -> String {
    if folder == "/" {
        format!("/{name}")
    } else {
        format!("{folder}/{name}")
    }
}

#[async_trait]
impl IRemoteStorage for FakeStorage {
    async fn list_folder(&self, path: &RemotePath) -> Result<Vec<RemoteEntry>, RemoteError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let path = path.as_str();
        if self.unlistable.lock().unwrap().contains(path) {
            return Err(RemoteError::Transient(format!("listfolder {path}: HTTP 503")));
        }
        if !self.folder_exists(path) {
            return Err(RemoteError::NotFound(format!("{path} (code 2005)")));
        }

        let mut entries: Vec<RemoteEntry> = self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.as_str() != "/" && parent_of(f) == path)
            .map(|f| RemoteEntry::folder(name_of(f)))
            .collect();
        entries.extend(
            self.files
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| parent_of(p) == path)
                .map(|(p, f)| RemoteEntry::file(name_of(p), f.content.len() as u64, f.modified)),
        );
        Ok(entries)
    }

    async fn create_folder(&self, path: &RemotePath) -> Result<FolderId, RemoteError> {
        let path = path.as_str();
        if !self.folder_exists(parent_of(path)) {
            return Err(RemoteError::NotFound(format!("parent of {path} (code 2002)")));
        }
        let mut folders = self.folders.lock().unwrap();
        folders.insert(path.to_string());
        self.created.lock().unwrap().push(path.to_string());
        Ok(folders.len() as FolderId)
    }

    async fn get_download_link(&self, path: &RemotePath) -> Result<String, RemoteError> {
        if self.files.lock().unwrap().contains_key(path.as_str()) {
            Ok(format!("{LINK_PREFIX}{path}"))
        } else {
            Err(RemoteError::NotFound(format!("{path} (code 2009)")))
        }
    }

    async fn open_download(&self, url: &str) -> Result<DownloadStream, RemoteError> {
        let path = url.strip_prefix(LINK_PREFIX).unwrap_or(url);
        let content = self
            .file(path)
            .ok_or_else(|| RemoteError::NotFound(format!("download: {url}")))?;
        let chunks: Vec<std::io::Result<Bytes>> = content
            .chunks(self.download_chunk.max(1))
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(DownloadStream {
            content_length: Some(content.len() as u64),
            body: Box::pin(futures_util::stream::iter(chunks)),
        })
    }

    async fn upload_stream(
        &self,
        folder: &RemotePath,
        name: &str,
        source: &dyn UploadSource,
        options: UploadOptions,
    ) -> Result<(), RemoteError> {
        if !self.folder_exists(folder.as_str()) {
            return Err(RemoteError::NotFound(format!("{folder} (code 2005)")));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);

        let mut stream = source.open().await?;
        let mut content = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            self.upload_chunks.lock().unwrap().push(chunk.len());
            content.extend_from_slice(&chunk);
        }

        let mut files = self.files.lock().unwrap();
        let mut target = join(folder.as_str(), name);
        if options.rename_if_exists {
            let mut n = 1;
            while files.contains_key(&target) {
                target = join(folder.as_str(), &format!("{name} ({n})"));
                n += 1;
            }
        }
        files.insert(
            target,
            StoredFile {
                content,
                modified: Some(Utc::now()),
            },
        );
        Ok(())
    }

    async fn account_info(&self) -> Result<AccountInfo, RemoteError> {
        Ok(AccountInfo {
            email: "fake@example.com".into(),
            quota: 1 << 30,
            used_quota: 0,
            premium: false,
        })
    }
}

/// Transfer settings for tests
pub fn config(workers: usize, mode: DuplicateMode) -> TransferConfig {
    TransferConfig::default()
        .with_workers(workers)
        .with_duplicate_mode(mode)
}

/// Writes `size` bytes of a repeating pattern
pub fn write_file(dir: &Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, content).unwrap();
    path
}

pub fn remote(path: &str) -> RemotePath {
    RemotePath::new(path.to_string()).unwrap()
}
