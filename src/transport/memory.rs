//! In-memory Drive transport
//!
//! Models the parts of Drive the storage layer relies on: a flat set of
//! objects linked into a folder graph by parent ids, the `root` alias, and
//! results returned in creation order. Every call is recorded so tests can
//! assert how many round trips an operation made.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use google_drive3::api::{File, Permission};
use parking_lot::RwLock;
use tracing::trace;

use crate::error::{Result, StorageError};
use crate::transport::{DriveQuery, DriveTransport, Media, FOLDER_MIME_TYPE, ROOT_FOLDER_ID};

/// Kinds of remote calls, in the order they were made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    Query,
    Get,
    Create,
    Download,
    Delete,
    Permission,
}

#[derive(Default)]
struct State {
    /// Objects in creation order
    objects: Vec<File>,
    contents: HashMap<String, Bytes>,
    permissions: HashMap<String, Vec<Permission>>,
    calls: Vec<RemoteCall>,
    next_id: u64,
    offline: bool,
}

impl State {
    /// Drop objects whose every parent is gone; Drive deletes folder
    /// contents along with the folder.
    fn remove_orphans(&mut self) {
        loop {
            let orphan = self.objects.iter().position(|f| {
                f.parents.as_ref().map_or(false, |ps| {
                    ps.iter()
                        .all(|p| p != ROOT_FOLDER_ID && self.position(p).is_none())
                })
            });
            let Some(index) = orphan else { break };
            let removed = self.objects.remove(index);
            if let Some(id) = removed.id {
                self.contents.remove(&id);
                self.permissions.remove(&id);
            }
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("obj{:04}", self.next_id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.objects
            .iter()
            .position(|f| f.id.as_deref() == Some(id))
    }

    fn insert(&mut self, mut file: File, content: Option<Bytes>) -> File {
        let id = self.allocate_id();
        let now = Utc::now();
        file.id = Some(id.clone());
        if file.parents.as_ref().map_or(true, |p| p.is_empty()) {
            file.parents = Some(vec![ROOT_FOLDER_ID.to_string()]);
        }
        file.created_time = Some(now);
        file.modified_time = Some(now);
        file.web_view_link = Some(format!("https://drive.example.test/file/d/{}/view", id));
        if let Some(content) = content {
            file.size = Some(content.len() as i64);
            self.contents.insert(id, content);
        }
        self.objects.push(file.clone());
        file
    }
}

/// Drive transport that keeps everything in process memory
pub struct MemoryTransport {
    state: RwLock<State>,
    echo_original_filename: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            echo_original_filename: true,
        }
    }

    /// A transport whose created files come back without `originalFilename`
    pub fn without_original_filename() -> Self {
        Self {
            echo_original_filename: false,
            ..Self::new()
        }
    }

    /// Seed a folder; `None` places it in the root
    pub fn insert_folder(&self, name: &str, parent: Option<&str>) -> String {
        let file = File {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: parent.map(|p| vec![p.to_string()]),
            ..Default::default()
        };
        self.seed(file, None)
    }

    /// Seed a file with content; `None` places it in the root
    pub fn insert_file(&self, name: &str, parent: Option<&str>, content: &[u8]) -> String {
        let file = File {
            name: Some(name.to_string()),
            mime_type: Some(
                mime_guess::from_path(name)
                    .first_or_octet_stream()
                    .to_string(),
            ),
            parents: parent.map(|p| vec![p.to_string()]),
            ..Default::default()
        };
        self.seed(file, Some(Bytes::copy_from_slice(content)))
    }

    fn seed(&self, file: File, content: Option<Bytes>) -> String {
        let created = self.state.write().insert(file, content);
        created.id.unwrap_or_default()
    }

    /// Make every subsequent call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.state.write().offline = offline;
    }

    /// Calls made so far, excluding seeding
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.read().calls.clone()
    }

    pub fn count_calls(&self, kind: RemoteCall) -> usize {
        self.state.read().calls.iter().filter(|c| **c == kind).count()
    }

    pub fn clear_calls(&self) {
        self.state.write().calls.clear();
    }

    /// All objects currently stored, in creation order
    pub fn objects(&self) -> Vec<File> {
        self.state.read().objects.clone()
    }

    /// Folders with this exact name, anywhere in the graph
    pub fn folders_named(&self, name: &str) -> Vec<File> {
        self.state
            .read()
            .objects
            .iter()
            .filter(|f| DriveQuery::folder_named(name).matches(f))
            .cloned()
            .collect()
    }

    /// Permissions granted on an object
    pub fn permissions_of(&self, id: &str) -> Vec<Permission> {
        self.state
            .read()
            .permissions
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Record a call and fail it if offline
    fn record(&self, state: &mut State, call: RemoteCall) -> Result<()> {
        state.calls.push(call);
        if state.offline {
            return Err(StorageError::Transport(format!(
                "{:?}: network unreachable",
                call
            )));
        }
        Ok(())
    }

    fn root() -> File {
        File {
            id: Some(ROOT_FOLDER_ID.to_string()),
            name: Some("My Drive".to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            ..Default::default()
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriveTransport for MemoryTransport {
    async fn query_objects(&self, query: &DriveQuery) -> Result<Vec<File>> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Query)?;
        trace!("memory query: {}", query.to_query_string());

        Ok(state
            .objects
            .iter()
            .filter(|f| query.matches(f))
            .cloned()
            .collect())
    }

    async fn get_object(&self, id: &str) -> Result<File> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Get)?;

        if id == ROOT_FOLDER_ID {
            return Ok(Self::root());
        }
        state
            .position(id)
            .map(|i| state.objects[i].clone())
            .ok_or_else(|| StorageError::NotFound(format!("File not found: {}", id)))
    }

    async fn create_object(&self, metadata: File, media: Option<Media>) -> Result<File> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Create)?;

        if metadata.name.as_deref().map_or(true, str::is_empty) {
            return Err(StorageError::Transport("create: name is required".to_string()));
        }
        if let Some(parents) = &metadata.parents {
            for parent in parents {
                if parent != ROOT_FOLDER_ID && state.position(parent).is_none() {
                    return Err(StorageError::NotFound(format!(
                        "Parent not found: {}",
                        parent
                    )));
                }
            }
        }

        let mut file = metadata;
        let content = match media {
            Some(media) => {
                if file.mime_type.is_none() {
                    file.mime_type = Some(media.mime_type.to_string());
                }
                if self.echo_original_filename {
                    file.original_filename = file.name.clone();
                }
                Some(media.content)
            }
            None => None,
        };
        Ok(state.insert(file, content))
    }

    async fn download_media(&self, id: &str) -> Result<Bytes> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Download)?;

        state
            .contents
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("No content for {}", id)))
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Delete)?;

        let index = state
            .position(id)
            .ok_or_else(|| StorageError::NotFound(format!("File not found: {}", id)))?;
        state.objects.remove(index);
        state.contents.remove(id);
        state.permissions.remove(id);

        state.remove_orphans();
        Ok(())
    }

    async fn create_permission(&self, object_id: &str, permission: Permission) -> Result<()> {
        let mut state = self.state.write();
        self.record(&mut state, RemoteCall::Permission)?;

        if state.position(object_id).is_none() {
            return Err(StorageError::NotFound(format!(
                "File not found: {}",
                object_id
            )));
        }
        state
            .permissions
            .entry(object_id.to_string())
            .or_default()
            .push(permission);
        Ok(())
    }
}
