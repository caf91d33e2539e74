pub mod gdrive;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use gdrive::{GoogleDriveStorage, StorageOptions};

/// File content read back from storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name the file was opened under
    pub name: String,
    pub content: Bytes,
}

impl StoredFile {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Directory listing; entries are the listed path joined with each child name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// File storage backend addressed by slash-separated virtual paths
///
/// Lookups that find nothing return an absent value (`false`, `0`, `None`,
/// an empty listing) rather than an error. The exception is [`open`], which
/// fails with [`NotFound`](crate::error::StorageError::NotFound) because a
/// caller asking for content cannot proceed without it.
///
/// [`open`]: Storage::open
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `content` under `name`, returning the name to use for later access
    async fn save(&self, name: &str, content: Bytes) -> Result<String>;

    /// Read a file's full content
    async fn open(&self, name: &str) -> Result<StoredFile>;

    /// Delete a file; deleting a missing file is not an error.
    ///
    /// A name with a single segment is searched across the whole drive, not
    /// only the top level: `delete("q1.csv")` removes `/reports/q1.csv` when
    /// no top-level `q1.csv` exists. Pass the full path `save` returned.
    async fn delete(&self, name: &str) -> Result<()>;

    /// True if the name resolves to an object.
    ///
    /// Single-segment names are searched across the whole drive, as for
    /// [`delete`](Storage::delete).
    async fn exists(&self, name: &str) -> Result<bool>;

    /// List the directories and files directly inside `path`
    async fn listdir(&self, path: &str) -> Result<Listing>;

    /// Size in bytes, 0 when the file does not exist
    async fn size(&self, name: &str) -> Result<u64>;

    /// Browser URL for the file
    async fn url(&self, name: &str) -> Result<Option<String>>;

    async fn created_time(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    async fn modified_time(&self, name: &str) -> Result<Option<DateTime<Utc>>>;

    /// Last access time
    ///
    /// Default implementation uses modified_time()
    async fn accessed_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        self.modified_time(name).await
    }
}
