//! Folder-tree planning for recursive transfers
//!
//! - [`plan_upload_tree`] walks a local directory, creates the matching remote
//!   folders and returns one upload item per file.
//! - [`plan_download_tree`] walks a remote folder breadth-first, creates the
//!   matching local directories and returns one download item per file.
//!
//! In both directions the tree is rooted at the source folder's own name:
//! uploading `~/photos` into `/Backups` produces `/Backups/photos/...`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cloudxfer_core::domain::{RemotePath, TransferItem};
use cloudxfer_core::ports::IRemoteStorage;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Plans the upload of a local directory tree under `remote_base`
///
/// Symlinks are not followed. Remote folders, parents included, are created
/// one depth level at a time with at most `concurrency` requests in flight;
/// a folder that cannot be created is logged, and uploads into it will fail
/// individually.
pub async fn plan_upload_tree(
    storage: &dyn IRemoteStorage,
    local_root: &Path,
    remote_base: &RemotePath,
    concurrency: usize,
) -> Result<Vec<TransferItem>> {
    let metadata = tokio::fs::metadata(local_root)
        .await
        .with_context(|| format!("Cannot read {}", local_root.display()))?;
    if !metadata.is_dir() {
        bail!("{} is not a directory", local_root.display());
    }
    let root_name = local_root
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable folder name", local_root.display()))?;
    let remote_root = remote_base.join(root_name)?;

    let mut folders: BTreeSet<RemotePath> = BTreeSet::new();
    let mut items = Vec::new();
    let mut pending: Vec<(PathBuf, RemotePath)> = vec![(local_root.to_path_buf(), remote_root)];

    while let Some((dir, remote_dir)) = pending.pop() {
        folders.insert(remote_dir.clone());
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Cannot list {}", dir.display()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Cannot list {}", dir.display()))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("Cannot stat {}", path.display()))?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %path.display(), "Skipping non UTF-8 name");
                continue;
            };

            if file_type.is_symlink() {
                debug!(path = %path.display(), "Skipping symlink");
            } else if file_type.is_dir() {
                pending.push((path, remote_dir.join(&name)?));
            } else if file_type.is_file() {
                items.push(TransferItem::upload(path, &remote_dir)?);
            }
        }
    }

    let all_folders: BTreeSet<RemotePath> = folders
        .iter()
        .flat_map(|f| f.ancestors().into_iter().chain(std::iter::once(f.clone())))
        .collect();
    create_by_depth(storage, all_folders, concurrency).await;

    info!(
        root = %local_root.display(),
        files = items.len(),
        "Planned upload tree"
    );
    Ok(items)
}

/// Creates folders shallowest first so parents exist before children
async fn create_by_depth(
    storage: &dyn IRemoteStorage,
    folders: BTreeSet<RemotePath>,
    concurrency: usize,
) {
    let mut by_depth: BTreeMap<usize, Vec<RemotePath>> = BTreeMap::new();
    for folder in folders.into_iter().filter(|f| !f.is_root()) {
        by_depth.entry(folder.depth()).or_default().push(folder);
    }

    for (depth, level) in by_depth {
        debug!(depth, count = level.len(), "Creating remote folders");
        stream::iter(level)
            .map(|folder| async move {
                if let Err(e) = storage.create_folder(&folder).await {
                    warn!(folder = %folder, error = %e, "Could not create remote folder");
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<()>>()
            .await;
    }
}

/// Plans the download of a remote folder tree into `local_base`
///
/// Folders that cannot be listed are logged and skipped; their files are
/// simply absent from the plan.
pub async fn plan_download_tree(
    storage: &dyn IRemoteStorage,
    remote_root: &RemotePath,
    local_base: &Path,
) -> Result<Vec<TransferItem>> {
    let local_root = local_base.join(remote_root.file_name().unwrap_or("download"));
    let mut items = Vec::new();
    let mut queue: VecDeque<(RemotePath, PathBuf)> = VecDeque::new();
    queue.push_back((remote_root.clone(), local_root));

    while let Some((remote_dir, local_dir)) = queue.pop_front() {
        let entries = match storage.list_folder(&remote_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(folder = %remote_dir, error = %e, "Could not list remote folder, skipping");
                continue;
            }
        };
        tokio::fs::create_dir_all(&local_dir)
            .await
            .with_context(|| format!("Cannot create {}", local_dir.display()))?;

        for entry in entries {
            let remote_path = match remote_dir.join(&entry.name) {
                Ok(path) => path,
                Err(e) => {
                    warn!(name = %entry.name, error = %e, "Skipping unusable remote name");
                    continue;
                }
            };
            let local_path = local_dir.join(&entry.name);
            if entry.is_folder {
                queue.push_back((remote_path, local_path));
            } else {
                items.push(TransferItem::download(remote_path, local_path));
            }
        }
    }

    info!(root = %remote_root, files = items.len(), "Planned download tree");
    Ok(items)
}
