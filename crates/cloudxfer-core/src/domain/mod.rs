//! Domain entities
//!
//! - Newtypes for validated remote paths and tokens
//! - Transfer items, outcomes and duplicate policy
//! - Remote and local file metadata snapshots
//! - Aggregate transfer statistics
//! - Domain-specific error types

pub mod errors;
pub mod metadata;
pub mod newtypes;
pub mod stats;
pub mod transfer;

// Re-export commonly used types
pub use errors::{DomainError, RemoteError};
pub use metadata::{AccountInfo, LocalFileInfo, RemoteEntry};
pub use newtypes::{RemotePath, Token};
pub use stats::{format_eta, format_size, format_speed, TransferStats};
pub use transfer::{
    BatchSummary, Direction, DuplicateMode, Region, TransferItem, TransferOutcome,
};
