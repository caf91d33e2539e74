//! gdrive-storage: file storage on Google Drive behind virtual paths
//!
//! Applications save, read, list and delete files by slash-separated paths;
//! this crate maps those paths onto Drive's folder graph and issues the
//! matching Drive API calls.
//!
//! # Architecture
//!
//! - **Paths** ([`path`]): lexical splitting and joining of virtual paths.
//! - **Transport** ([`transport`]): the [`DriveTransport`](transport::DriveTransport)
//!   capability, implemented over the Drive v3 API and in memory.
//! - **Folder tree** ([`tree`]): resolves paths to Drive objects and
//!   materializes missing folder chains.
//! - **Permissions** ([`permission`]): validated grants applied to new files.
//! - **Storage** ([`storage`]): the [`Storage`](storage::Storage) trait and
//!   its Google Drive implementation.
//!
//! Nothing is cached: every operation resolves its path again. Concurrent
//! writers creating the same missing folder can produce duplicate folders;
//! see [`tree`].
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use gdrive_storage::config::StorageConfig;
//! use gdrive_storage::storage::{GoogleDriveStorage, Storage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = GoogleDriveStorage::new(StorageConfig::with_key_file("key.json")).await?;
//!
//! let name = storage.save("/reports/q1.csv", Bytes::from_static(b"a,b\n")).await?;
//! let file = storage.open(&name).await?;
//! assert_eq!(&file.content[..], b"a,b\n");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod path;
pub mod permission;
pub mod storage;
pub mod transport;
pub mod tree;

pub use error::{Result, StorageError};
