//! Recursive planning in both directions

use std::sync::Arc;

use cloudxfer_core::domain::{Direction, DuplicateMode};
use cloudxfer_engine::{plan_download_tree, plan_upload_tree, ParallelTransferOrchestrator};

use crate::common::{self, remote, FakeStorage};

/// photos/{a.txt, sub/b.txt, sub/deeper/c.txt, empty/}
fn build_local_tree(base: &std::path::Path) -> std::path::PathBuf {
    let root = base.join("photos");
    common::write_file(&root, "a.txt", 11);
    common::write_file(&root.join("sub"), "b.txt", 22);
    common::write_file(&root.join("sub/deeper"), "c.txt", 33);
    std::fs::create_dir_all(root.join("empty")).unwrap();
    root
}

#[tokio::test]
async fn test_plan_upload_tree_creates_folders_shallowest_first() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_local_tree(dir.path());
    let storage = FakeStorage::shared();

    let items = plan_upload_tree(storage.as_ref(), &root, &remote("/Backups"), 4)
        .await
        .unwrap();

    let mut planned: Vec<String> = items.iter().map(|i| i.remote_path.to_string()).collect();
    planned.sort();
    assert_eq!(
        planned,
        vec![
            "/Backups/photos/a.txt",
            "/Backups/photos/sub/b.txt",
            "/Backups/photos/sub/deeper/c.txt",
        ]
    );
    assert!(items.iter().all(|i| i.direction == Direction::Upload));

    let created = storage.created_folders();
    assert_eq!(created[0], "/Backups");
    assert_eq!(created[1], "/Backups/photos");
    assert_eq!(created.last().unwrap(), "/Backups/photos/sub/deeper");
    assert!(created.contains(&"/Backups/photos/empty".to_string()));
    assert_eq!(created.len(), 5);
}

#[cfg(unix)]
#[tokio::test]
async fn test_plan_upload_tree_skips_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_local_tree(dir.path());
    let outside = common::write_file(dir.path(), "outside.txt", 5);
    std::os::unix::fs::symlink(&outside, root.join("link.txt")).unwrap();
    std::os::unix::fs::symlink(root.join("sub"), root.join("loop")).unwrap();

    let items = plan_upload_tree(FakeStorage::shared().as_ref(), &root, &remote("/"), 2)
        .await
        .unwrap();

    assert_eq!(items.len(), 3);
    assert!(items
        .iter()
        .all(|i| !i.remote_path.as_str().contains("link") && !i.remote_path.as_str().contains("loop")));
}

#[tokio::test]
async fn test_plan_upload_tree_rejects_file_root() {
    let dir = tempfile::tempdir().unwrap();
    let file = common::write_file(dir.path(), "single.txt", 3);

    let result = plan_upload_tree(FakeStorage::shared().as_ref(), &file, &remote("/"), 2).await;

    assert!(result.unwrap_err().to_string().contains("not a directory"));
}

#[tokio::test]
async fn test_plan_download_tree_mirrors_remote() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FakeStorage::new()
        .with_folder("/Docs")
        .with_folder("/Docs/2024")
        .with_folder("/Docs/empty")
        .with_file("/Docs/readme.md", b"# hi")
        .with_file("/Docs/2024/report.pdf", b"pdf");

    let items = plan_download_tree(&storage, &remote("/Docs"), dir.path())
        .await
        .unwrap();

    let mut planned: Vec<_> = items
        .iter()
        .map(|i| (i.remote_path.to_string(), i.local_path.clone()))
        .collect();
    planned.sort();
    assert_eq!(
        planned,
        vec![
            (
                "/Docs/2024/report.pdf".to_string(),
                dir.path().join("Docs/2024/report.pdf")
            ),
            ("/Docs/readme.md".to_string(), dir.path().join("Docs/readme.md")),
        ]
    );
    assert!(dir.path().join("Docs/empty").is_dir());
    assert!(dir.path().join("Docs/2024").is_dir());
}

#[tokio::test]
async fn test_plan_download_tree_skips_unlistable_folder() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FakeStorage::new()
        .with_folder("/Docs")
        .with_folder("/Docs/locked")
        .with_file("/Docs/locked/secret.txt", b"x")
        .with_file("/Docs/open.txt", b"y")
        .with_unlistable("/Docs/locked");

    let items = plan_download_tree(&storage, &remote("/Docs"), dir.path())
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].remote_path.as_str(), "/Docs/open.txt");
    assert!(!dir.path().join("Docs/locked").exists());
}

#[tokio::test]
async fn test_upload_tree_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = build_local_tree(dir.path());
    let storage = Arc::new(FakeStorage::new().with_folder("/Backups"));

    let items = plan_upload_tree(storage.as_ref(), &root, &remote("/Backups"), 4)
        .await
        .unwrap();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(3, DuplicateMode::Skip));
    let report = orchestrator.run_batch(items).await;

    assert_eq!(report.summary.as_tuple(), (3, 0, 0));
    assert_eq!(report.stats.transferred_bytes, 66);
    assert_eq!(
        storage.file("/Backups/photos/sub/deeper/c.txt").unwrap().len(),
        33
    );
}

#[tokio::test]
async fn test_download_tree_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        FakeStorage::new()
            .with_folder("/Docs")
            .with_folder("/Docs/nested")
            .with_file("/Docs/a.txt", b"alpha")
            .with_file("/Docs/nested/b.txt", b"beta"),
    );

    let items = plan_download_tree(storage.as_ref(), &remote("/Docs"), dir.path())
        .await
        .unwrap();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage, common::config(2, DuplicateMode::Rename));
    let report = orchestrator.run_batch(items).await;

    assert_eq!(report.summary.as_tuple(), (2, 0, 0));
    assert_eq!(report.stats.total_bytes, 9);
    assert_eq!(
        std::fs::read(dir.path().join("Docs/nested/b.txt")).unwrap(),
        b"beta"
    );
}
