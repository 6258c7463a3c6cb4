//! cloudxfer Engine - Parallel transfer engine
//!
//! Fans a batch of uploads or downloads out across a bounded worker pool:
//!
//! - [`resolver`] - Duplicate policy decisions (skip / overwrite / rename)
//! - [`namer`] - Unique local names for keep-both downloads
//! - [`progress`] - Mutex-guarded aggregate progress with snapshots
//! - [`unit`] - One file's transfer, streamed in bounded chunks
//! - [`orchestrator`] - Worker pool and outcome aggregation
//! - [`tree`] - Folder-tree planning for recursive transfers
//!
//! The engine talks to the remote service only through
//! [`cloudxfer_core::ports::IRemoteStorage`].

pub mod namer;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod tree;
pub mod unit;

pub use orchestrator::{BatchReport, FileResult, ParallelTransferOrchestrator};
pub use progress::{ProgressCallback, ProgressTracker};
pub use resolver::{DuplicateResolver, Resolution};
pub use tree::{plan_download_tree, plan_upload_tree};
pub use unit::StreamTransferUnit;
