//! Batch-level behavior: aggregate counts, progress and streaming bounds

use std::sync::{Arc, Mutex};

use cloudxfer_core::domain::{DuplicateMode, RemotePath, TransferStats};
use cloudxfer_engine::unit::CHUNK_SIZE;
use cloudxfer_engine::{ParallelTransferOrchestrator, ProgressCallback};

use crate::common::{self, remote, FakeStorage};

#[tokio::test]
async fn test_three_files_two_workers_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        common::write_file(dir.path(), "a.txt", 10),
        common::write_file(dir.path(), "b.txt", 20),
        common::write_file(dir.path(), "c.txt", 30),
    ];
    let storage = FakeStorage::shared();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(2, DuplicateMode::Rename));

    let report = orchestrator.upload_files(&paths, &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (3, 0, 0));
    assert_eq!(report.stats.files_completed, 3);
    assert_eq!(report.stats.files_total, 3);
    assert_eq!(report.stats.transferred_bytes, 60);
    assert_eq!(report.stats.total_bytes, 60);
    assert_eq!(storage.file("/b.txt").unwrap().len(), 20);
    assert_eq!(
        storage.file("/c.txt").unwrap(),
        std::fs::read(&paths[2]).unwrap()
    );
}

#[tokio::test]
async fn test_download_with_one_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(
        FakeStorage::new()
            .with_folder("/docs")
            .with_file("/docs/present.txt", b"hello"),
    );
    let orchestrator =
        ParallelTransferOrchestrator::new(storage, common::config(2, DuplicateMode::Rename));

    let report = orchestrator
        .download_files(vec![
            (remote("/docs/present.txt"), dir.path().join("present.txt")),
            (remote("/docs/missing.txt"), dir.path().join("missing.txt")),
        ])
        .await;

    assert_eq!(report.summary.as_tuple(), (1, 0, 1));
    assert_eq!(report.stats.files_completed, 2);
    assert_eq!(
        std::fs::read(dir.path().join("present.txt")).unwrap(),
        b"hello"
    );
    let failure = report.failures().next().unwrap();
    assert!(failure.outcome.to_string().contains("Not found"));
}

#[tokio::test]
async fn test_download_grows_total_bytes_and_splits_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let content: Vec<u8> = (0..50_000u32).map(|i| (i % 7) as u8).collect();
    let storage = Arc::new(FakeStorage::new().with_file("/big.bin", &content));
    let orchestrator =
        ParallelTransferOrchestrator::new(storage, common::config(1, DuplicateMode::Overwrite));

    let report = orchestrator
        .download_files(vec![(remote("/big.bin"), dir.path().join("out/big.bin"))])
        .await;

    assert_eq!(report.summary.as_tuple(), (1, 0, 0));
    assert_eq!(report.stats.total_bytes, 50_000);
    assert_eq!(report.stats.transferred_bytes, 50_000);
    assert_eq!(std::fs::read(dir.path().join("out/big.bin")).unwrap(), content);
}

#[tokio::test]
async fn test_upload_never_exceeds_chunk_size() {
    let dir = tempfile::tempdir().unwrap();
    let size = 3 * 1024 * 1024 + 123;
    let path = common::write_file(dir.path(), "large.bin", size);
    let storage = FakeStorage::shared();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(1, DuplicateMode::Rename));

    let report = orchestrator.upload_files(&[path], &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (1, 0, 0));
    let chunks = storage.upload_chunks();
    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|&c| c <= CHUNK_SIZE), "chunk above bound");
    assert_eq!(chunks.iter().sum::<usize>(), size);
}

#[tokio::test]
async fn test_progress_is_monotonic_under_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..12)
        .map(|i| common::write_file(dir.path(), &format!("f{i}.bin"), 40_000 + i * 1000))
        .collect();
    let expected: u64 = paths
        .iter()
        .map(|p| std::fs::metadata(p).unwrap().len())
        .sum();

    let observed: Arc<Mutex<Vec<TransferStats>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let callback: ProgressCallback = Arc::new(move |stats| sink.lock().unwrap().push(*stats));

    let orchestrator = ParallelTransferOrchestrator::new(
        FakeStorage::shared(),
        common::config(4, DuplicateMode::Rename),
    )
    .with_progress(callback);
    let report = orchestrator.upload_files(&paths, &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (12, 0, 0));
    let observed = observed.lock().unwrap();
    assert!(!observed.is_empty());
    assert!(observed
        .windows(2)
        .all(|w| w[0].transferred_bytes <= w[1].transferred_bytes));
    assert!(observed
        .iter()
        .all(|s| s.files_completed <= s.files_total));
    assert_eq!(report.stats.transferred_bytes, expected);
}

#[tokio::test]
async fn test_missing_local_file_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        common::write_file(dir.path(), "ok1.txt", 5),
        dir.path().join("vanished.txt"),
        common::write_file(dir.path(), "ok2.txt", 5),
    ];
    let storage = FakeStorage::shared();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(2, DuplicateMode::Skip));

    let report = orchestrator.upload_files(&paths, &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (2, 0, 1));
    assert_eq!(report.stats.total_bytes, 10);
    assert_eq!(storage.upload_count(), 2);
    let failure = report.failures().next().unwrap();
    assert!(failure.outcome.to_string().contains("Local I/O error"));
}

#[tokio::test]
async fn test_path_without_file_name_counts_toward_totals() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        common::write_file(dir.path(), "a.txt", 8),
        dir.path().join(".."),
    ];
    let observed: Arc<Mutex<Vec<TransferStats>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    let callback: ProgressCallback = Arc::new(move |stats| sink.lock().unwrap().push(*stats));
    let storage = FakeStorage::shared();
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(2, DuplicateMode::Rename))
            .with_progress(callback);

    let report = orchestrator.upload_files(&paths, &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (1, 0, 1));
    assert_eq!(report.summary.total(), report.stats.files_total);
    assert_eq!(report.stats.files_total, 2);
    assert_eq!(report.stats.files_completed, 2);
    assert_eq!(report.results.len(), 2);
    assert_eq!(storage.upload_count(), 1);
    let observed = observed.lock().unwrap();
    assert!(observed.iter().all(|s| s.files_total == 2));
    assert!(observed.last().unwrap().is_complete());
}

#[tokio::test]
async fn test_upload_into_missing_folder_fails_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        common::write_file(dir.path(), "a.txt", 3),
        common::write_file(dir.path(), "b.txt", 4),
    ];
    let orchestrator = ParallelTransferOrchestrator::new(
        FakeStorage::shared(),
        common::config(2, DuplicateMode::Rename),
    );

    let report = orchestrator.upload_files(&paths, &remote("/nowhere")).await;

    assert_eq!(report.summary.as_tuple(), (0, 0, 2));
    assert_eq!(report.stats.files_completed, 2);
}

#[tokio::test]
async fn test_more_workers_than_items() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = (0..3)
        .map(|i| common::write_file(dir.path(), &format!("{i}.txt"), 8))
        .collect();
    let orchestrator = ParallelTransferOrchestrator::new(
        FakeStorage::shared(),
        common::config(8, DuplicateMode::Rename),
    );

    let report = orchestrator.upload_files(&paths, &RemotePath::root()).await;

    assert_eq!(report.summary.total(), 3);
    assert_eq!(report.summary.as_tuple(), (3, 0, 0));
    assert_eq!(report.results.len(), 3);
}

#[tokio::test]
async fn test_empty_batch() {
    let orchestrator = ParallelTransferOrchestrator::new(
        FakeStorage::shared(),
        common::config(4, DuplicateMode::Rename),
    );

    let report = orchestrator.run_batch(Vec::new()).await;

    assert_eq!(report.summary.as_tuple(), (0, 0, 0));
    assert!(report.stats.is_complete());
}

#[tokio::test]
async fn test_rename_upload_keeps_both_copies() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), "dup.txt", 6);
    let storage = Arc::new(FakeStorage::new().with_file("/dup.txt", b"old"));
    let orchestrator =
        ParallelTransferOrchestrator::new(storage.clone(), common::config(1, DuplicateMode::Rename));

    let report = orchestrator.upload_files(&[path], &RemotePath::root()).await;

    assert_eq!(report.summary.as_tuple(), (1, 0, 0));
    assert_eq!(storage.file("/dup.txt").unwrap(), b"old");
    assert_eq!(storage.file_names().len(), 2);
    // Rename mode never lists the destination
    assert_eq!(storage.listing_count(), 0);
}
