//! Google Drive storage backend
//!
//! Maps the [`Storage`] operations onto Drive. Paths are resolved through a
//! [`FolderTree`] on every call; nothing is cached between calls, so each
//! operation costs one or more sequential round trips.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use google_drive3::api::File;
use tracing::{debug, info, trace};

use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::path::{join_path, join_segments, replace_leaf, split_path};
use crate::permission::PermissionSet;
use crate::storage::{Listing, Storage, StoredFile};
use crate::transport::drive::DriveHubTransport;
use crate::transport::{is_folder, DriveQuery, DriveTransport, Media, ROOT_FOLDER_ID};
use crate::tree::{object_id, FolderTree};

/// Options that shape how files are written
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Folder path prepended to every saved name.
    ///
    /// Applied by `save` only. Reads, deletes and listings take the path as
    /// given, so callers must use the name `save` returns.
    pub root_prefix: Option<String>,

    /// Grants applied to each new file, in order
    pub permissions: PermissionSet,
}

/// Storage backend that keeps files in Google Drive
pub struct GoogleDriveStorage<T: DriveTransport = DriveHubTransport> {
    transport: Arc<T>,
    tree: FolderTree<T>,
    options: StorageOptions,
}

impl GoogleDriveStorage<DriveHubTransport> {
    /// Authorize with the configured service account and build the backend.
    ///
    /// Fails immediately if the key cannot be read or parsed.
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let transport =
            DriveHubTransport::new(&config.credentials, config.user_email.as_deref()).await?;
        info!(
            "Google Drive storage ready (root prefix {:?}, {} grant(s))",
            config.root_prefix,
            config.permissions.len()
        );

        Ok(Self::with_transport(
            Arc::new(transport),
            StorageOptions {
                root_prefix: config.root_prefix,
                permissions: config.permissions,
            },
        ))
    }
}

impl<T: DriveTransport> GoogleDriveStorage<T> {
    /// Build the backend over any transport
    pub fn with_transport(transport: Arc<T>, options: StorageOptions) -> Self {
        Self {
            tree: FolderTree::new(transport.clone()),
            transport,
            options,
        }
    }

    /// Path resolution and folder materialization over this backend's transport
    pub fn tree(&self) -> &FolderTree<T> {
        &self.tree
    }

    /// Prepend the root prefix, if any
    fn prefixed(&self, name: &str) -> String {
        match self.options.root_prefix.as_deref() {
            Some(prefix) if !prefix.trim_matches('/').is_empty() => format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                name.trim_start_matches('/')
            ),
            _ => name.to_string(),
        }
    }

    async fn lookup(&self, name: &str) -> Result<Option<File>> {
        self.tree.resolve(name, None).await
    }

    async fn list_children(&self, folder_id: &str, query: DriveQuery) -> Result<Vec<String>> {
        let children = self
            .transport
            .query_objects(&query.in_parent(Some(folder_id)))
            .await?;
        Ok(children.into_iter().filter_map(|f| f.name).collect())
    }
}

#[async_trait]
impl<T: DriveTransport + 'static> Storage for GoogleDriveStorage<T> {
    async fn save(&self, name: &str, content: Bytes) -> Result<String> {
        // Checked before prefixing, or the prefix itself would become the file name
        if split_path(name).is_empty() {
            return Err(StorageError::InvalidPath(format!(
                "No file name in {:?}",
                name
            )));
        }
        let full_name = self.prefixed(name);
        let segments = split_path(&full_name);
        let Some((leaf, dirs)) = segments.split_last() else {
            return Err(StorageError::InvalidPath(format!(
                "No file name in {:?}",
                full_name
            )));
        };
        debug!("save: {:?} ({} bytes)", full_name, content.len());

        let folder = self.tree.ensure_folder(&join_segments(dirs), None).await?;
        let folder_id = object_id(&folder)?;

        let mime_type = mime_guess::from_path(leaf).first_or_octet_stream();
        let metadata = File {
            name: Some(leaf.to_string()),
            mime_type: Some(mime_type.to_string()),
            parents: Some(vec![folder_id]),
            ..Default::default()
        };
        let created = self
            .transport
            .create_object(metadata, Some(Media::new(content, mime_type)))
            .await?;
        let file_id = object_id(&created)?;

        for grant in self.options.permissions.iter() {
            trace!("granting {} to {:?} on {}", grant.role, grant.principal, file_id);
            self.transport
                .create_permission(&file_id, grant.to_request_body())
                .await?;
        }

        let stored_leaf = created.original_filename.as_deref().unwrap_or(*leaf);
        Ok(replace_leaf(&full_name, stored_leaf))
    }

    async fn open(&self, name: &str) -> Result<StoredFile> {
        let file = self
            .lookup(name)
            .await?
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        let content = self.transport.download_media(&object_id(&file)?).await?;

        Ok(StoredFile {
            name: name.to_string(),
            content,
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match self.lookup(name).await? {
            Some(file) => {
                debug!("delete: {:?}", name);
                self.transport.delete_object(&object_id(&file)?).await
            }
            None => {
                trace!("delete: {:?} not found, nothing to do", name);
                Ok(())
            }
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name).await?.is_some())
    }

    async fn listdir(&self, path: &str) -> Result<Listing> {
        let folder_id = if split_path(path).is_empty() {
            ROOT_FOLDER_ID.to_string()
        } else {
            match self.lookup(path).await? {
                Some(folder) => object_id(&folder)?,
                None => return Ok(Listing::default()),
            }
        };

        let files = self
            .list_children(&folder_id, DriveQuery::all().excluding_folders())
            .await?;
        let directories = self
            .list_children(&folder_id, DriveQuery::all().only_folders())
            .await?;

        Ok(Listing {
            directories: directories.iter().map(|n| join_path(path, n)).collect(),
            files: files.iter().map(|n| join_path(path, n)).collect(),
        })
    }

    async fn size(&self, name: &str) -> Result<u64> {
        Ok(self
            .lookup(name)
            .await?
            .filter(|f| !is_folder(f))
            .and_then(|f| f.size)
            .map(|s| s.max(0) as u64)
            .unwrap_or(0))
    }

    async fn url(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .lookup(name)
            .await?
            .and_then(|f| f.web_view_link.or(f.web_content_link)))
    }

    async fn created_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lookup(name).await?.and_then(|f| f.created_time))
    }

    async fn modified_time(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lookup(name).await?.and_then(|f| f.modified_time))
    }
}
