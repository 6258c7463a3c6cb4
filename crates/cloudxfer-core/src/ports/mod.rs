//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the transfer engine depends on; their
//! implementations live in adapter crates.
//!
//! - [`IRemoteStorage`] - the remote object-storage API
//! - [`ITokenStore`] - persistence of the authentication token

pub mod remote_storage;
pub mod token_store;

pub use remote_storage::{
    ByteStream, DownloadStream, FolderId, IRemoteStorage, UploadOptions, UploadSource,
};
pub use token_store::ITokenStore;
