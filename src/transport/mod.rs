pub mod drive;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use bytes::Bytes;
use google_drive3::api::{File, Permission};
use mime_guess::Mime;

use crate::error::Result;

pub use query::{DriveQuery, MimeFilter};

/// MIME type Drive uses to mark folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Alias Drive accepts for the account's top-level folder
pub const ROOT_FOLDER_ID: &str = "root";

/// Content attached to a file creation
#[derive(Debug, Clone)]
pub struct Media {
    pub content: Bytes,
    pub mime_type: Mime,
}

impl Media {
    pub fn new(content: Bytes, mime_type: Mime) -> Self {
        Self { content, mime_type }
    }
}

/// Remote calls the storage layer needs from Drive
///
/// Implementations perform exactly one logical remote operation per call
/// and do no caching. Absence is reported as
/// [`StorageError::NotFound`](crate::error::StorageError::NotFound) only by
/// the calls that address an object by id; queries return an empty list.
#[async_trait]
pub trait DriveTransport: Send + Sync {
    /// List every object matching the query, across all result pages
    async fn query_objects(&self, query: &DriveQuery) -> Result<Vec<File>>;

    /// Fetch a single object by id (or the `root` alias)
    async fn get_object(&self, id: &str) -> Result<File>;

    /// Create a folder (no media) or a file (with media)
    async fn create_object(&self, metadata: File, media: Option<Media>) -> Result<File>;

    /// Download an object's full content
    async fn download_media(&self, id: &str) -> Result<Bytes>;

    async fn delete_object(&self, id: &str) -> Result<()>;

    async fn create_permission(&self, object_id: &str, permission: Permission) -> Result<()>;
}

/// True if the object is a Drive folder
pub fn is_folder(file: &File) -> bool {
    file.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
}
