//! Virtual paths over the Drive folder graph
//!
//! Drive stores objects flat and links them to folders through parent ids;
//! names are not unique. [`FolderTree`] walks a virtual path one segment at
//! a time, querying for the folder with the exact segment name under the
//! current parent. The same walk serves lookups (stop on a miss) and folder
//! materialization (create on a miss).
//!
//! # Concurrent materialization
//!
//! Drive has no conditional create, so finding a folder and creating it
//! when missing are two separate calls. Two callers materializing the same
//! missing path at the same time can both see the miss and both create the
//! folder, leaving same-named siblings. Later walks pick the first one the
//! service returns. Callers that need a single folder must serialize their
//! own writes to a path.

use std::sync::Arc;

use google_drive3::api::File;
use tracing::{debug, trace};

use crate::error::{Result, StorageError};
use crate::path::split_path;
use crate::transport::{DriveQuery, DriveTransport, FOLDER_MIME_TYPE, ROOT_FOLDER_ID};

/// What a walk does when a segment is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMiss {
    /// Stop and report the path as absent
    Report,
    /// Create the missing folder and continue
    Create,
}

/// Resolves virtual paths against the remote folder graph
pub struct FolderTree<T: DriveTransport> {
    transport: Arc<T>,
}

impl<T: DriveTransport> Clone for FolderTree<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T: DriveTransport> FolderTree<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Find the object a virtual path names.
    ///
    /// Every segment but the last must be a folder with exactly that name.
    /// The last segment matches an object of any type by exact name; if none
    /// exists, the first child whose name contains the segment is accepted,
    /// which tolerates names the service altered on upload. When `parent_id`
    /// is `None` the first segment is searched across the whole drive.
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub async fn resolve(&self, path: &str, parent_id: Option<&str>) -> Result<Option<File>> {
        trace!("resolve: {:?} under {:?}", path, parent_id);
        self.walk(path, parent_id, OnMiss::Report).await
    }

    /// Find or create the folder chain a virtual path names.
    ///
    /// Existing folders are reused; only missing segments are created, each
    /// under its resolved parent. Repeated sequential calls return the same
    /// folder. See the module docs for concurrent callers.
    ///
    /// Unlike [`resolve`](Self::resolve), the final segment never takes the
    /// substring fallback and never matches a file: only a folder with
    /// exactly that name is reused. A folder such as `reports-2024` is
    /// therefore never chosen for `reports`, so files saved under a path can
    /// be found again by that path.
    pub async fn ensure_folder(&self, path: &str, parent_id: Option<&str>) -> Result<File> {
        trace!("ensure_folder: {:?} under {:?}", path, parent_id);
        self.walk(path, parent_id, OnMiss::Create)
            .await?
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn walk(&self, path: &str, parent_id: Option<&str>, on_miss: OnMiss) -> Result<Option<File>> {
        let segments = split_path(path);
        let Some((leaf, dirs)) = segments.split_last() else {
            let id = parent_id.unwrap_or(ROOT_FOLDER_ID);
            return self.transport.get_object(id).await.map(Some);
        };

        let mut parent = parent_id.map(str::to_string);
        // Children of a folder created during this walk cannot exist yet
        let mut created = false;

        for dir in dirs {
            let existing = if created {
                None
            } else {
                self.find_folder(dir, parent.as_deref()).await?
            };
            let folder = match (existing, on_miss) {
                (Some(folder), _) => folder,
                (None, OnMiss::Report) => return Ok(None),
                (None, OnMiss::Create) => {
                    created = true;
                    self.create_folder(dir, parent.as_deref()).await?
                }
            };
            parent = Some(object_id(&folder)?);
        }

        match on_miss {
            OnMiss::Report => self.find_leaf(leaf, parent.as_deref()).await,
            OnMiss::Create => {
                let existing = if created {
                    None
                } else {
                    self.find_folder(leaf, parent.as_deref()).await?
                };
                match existing {
                    Some(folder) => Ok(Some(folder)),
                    None => self.create_folder(leaf, parent.as_deref()).await.map(Some),
                }
            }
        }
    }

    /// Folder named exactly `name` under `parent`
    async fn find_folder(&self, name: &str, parent: Option<&str>) -> Result<Option<File>> {
        let query = DriveQuery::folder_named(name).in_parent(parent);
        let folders = self.transport.query_objects(&query).await?;

        // The service may match loosely; only an identical name counts
        Ok(folders
            .into_iter()
            .find(|f| f.name.as_deref() == Some(name)))
    }

    /// Object of any type named `name` under `parent`, with the substring fallback
    async fn find_leaf(&self, name: &str, parent: Option<&str>) -> Result<Option<File>> {
        let query = DriveQuery::named(name).in_parent(parent);
        let exact = self.transport.query_objects(&query).await?;
        if let Some(file) = exact.into_iter().next() {
            return Ok(Some(file));
        }
        self.find_leaf_fallback(name, parent).await
    }

    /// First child of `parent` (or of the whole drive) whose name contains `name`
    async fn find_leaf_fallback(&self, name: &str, parent: Option<&str>) -> Result<Option<File>> {
        let query = DriveQuery::all().in_parent(parent);
        let candidates = self.transport.query_objects(&query).await?;

        let found = candidates
            .into_iter()
            .find(|f| f.name.as_deref().map_or(false, |n| n.contains(name)));
        if let Some(file) = &found {
            debug!(
                "resolved {:?} by partial match to {:?}",
                name,
                file.name.as_deref().unwrap_or_default()
            );
        }
        Ok(found)
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<File> {
        debug!("create_folder: {:?} under {:?}", name, parent);

        let metadata = File {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: parent.map(|p| vec![p.to_string()]),
            ..Default::default()
        };
        self.transport.create_object(metadata, None).await
    }
}

/// Id of a remote object, which every object the service returns must carry
pub fn object_id(file: &File) -> Result<String> {
    file.id
        .clone()
        .ok_or_else(|| StorageError::MalformedResponse("File has no ID".to_string()))
}
