//! Google Drive transport
//!
//! Talks to the Drive v3 API through `DriveHub`, authenticated as a service
//! account. Timeouts and in-upload retries are left to the hub.

use std::io::Cursor;
use std::pin::Pin;

use async_stream::try_stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use google_drive3::api::{File, Permission, Scope};
use google_drive3::yup_oauth2::{
    parse_service_account_key, read_service_account_key, ServiceAccountAuthenticator,
    ServiceAccountKey,
};
use google_drive3::DriveHub;
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::HttpConnector;
use mime_guess::Mime;
use tracing::{debug, info, trace};

use crate::config::CredentialsSource;
use crate::error::{Result, StorageError};
use crate::transport::{DriveQuery, DriveTransport, Media};

/// Fields to request for file metadata
const FILE_FIELDS: &str = "id, name, mimeType, size, createdTime, modifiedTime, parents, \
                           webViewLink, webContentLink, originalFilename";

/// Fields to request for file lists
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, createdTime, \
                           modifiedTime, parents, webViewLink, webContentLink, originalFilename)";

/// Largest page Drive returns for files.list
const PAGE_SIZE: i32 = 1000;

/// Uploads above this size go through the resumable protocol
const RESUMABLE_UPLOAD_THRESHOLD: usize = 5 * 1024 * 1024;

type DriveClient = DriveHub<hyper_rustls::HttpsConnector<HttpConnector>>;

type FileStream<'a> = Pin<Box<dyn Stream<Item = Result<File>> + Send + 'a>>;

/// Drive transport backed by the Drive v3 REST API
pub struct DriveHubTransport {
    hub: DriveClient,
}

impl DriveHubTransport {
    /// Authorize against Drive with a service account key.
    ///
    /// `subject` impersonates a domain user through domain-wide delegation.
    /// Credential problems surface here, not on first use.
    pub async fn new(credentials: &CredentialsSource, subject: Option<&str>) -> Result<Self> {
        // Ignore the error: a provider may already be installed process-wide
        let _ = rustls::crypto::ring::default_provider().install_default();

        let key = load_key(credentials).await?;

        let mut builder = ServiceAccountAuthenticator::builder(key);
        if let Some(subject) = subject {
            builder = builder.subject(subject);
        }
        let auth = builder.build().await.map_err(|e| {
            StorageError::Config(format!("Failed to create authenticator: {}", e))
        })?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| StorageError::Config(format!("Failed to load TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(https);

        info!("Drive transport authorized");
        Ok(Self {
            hub: DriveHub::new(client, auth),
        })
    }

    /// Stream every page of a files.list query
    fn list_pages(&self, query: String) -> FileStream<'_> {
        Box::pin(try_stream! {
            let mut page_token: Option<String> = None;

            loop {
                let mut request = self
                    .hub
                    .files()
                    .list()
                    .q(&query)
                    .add_scope(Scope::Full)
                    .param("fields", LIST_FIELDS)
                    .page_size(PAGE_SIZE);

                if let Some(token) = page_token.take() {
                    request = request.page_token(&token);
                }

                let result = request
                    .doit()
                    .await
                    .map_err(|e| api_error("list", e))?;

                for file in result.1.files.unwrap_or_default() {
                    yield file;
                }

                page_token = result.1.next_page_token;
                if page_token.is_none() {
                    break;
                }
            }
        })
    }
}

async fn load_key(credentials: &CredentialsSource) -> Result<ServiceAccountKey> {
    match credentials {
        CredentialsSource::KeyFile(path) => read_service_account_key(path).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to read service account key {:?}: {}",
                path, e
            ))
        }),
        CredentialsSource::KeyContents(json) => parse_service_account_key(json).map_err(|e| {
            StorageError::Config(format!("Failed to parse service account key: {}", e))
        }),
    }
}

/// Map a Drive API error, recognising missing objects
fn api_error(operation: &str, e: google_drive3::Error) -> StorageError {
    let message = e.to_string();
    if message.contains("404") || message.contains("notFound") {
        StorageError::NotFound(format!("{}: {}", operation, message))
    } else {
        StorageError::Transport(format!("{}: {}", operation, message))
    }
}

fn parse_mime(mime_type: &str) -> Result<Mime> {
    mime_type
        .parse()
        .map_err(|e| StorageError::InvalidPath(format!("Bad MIME type {:?}: {}", mime_type, e)))
}

#[async_trait]
impl DriveTransport for DriveHubTransport {
    async fn query_objects(&self, query: &DriveQuery) -> Result<Vec<File>> {
        let q = query.to_query_string();
        trace!("query_objects: {}", q);
        self.list_pages(q).try_collect().await
    }

    async fn get_object(&self, id: &str) -> Result<File> {
        trace!("get_object: {}", id);

        let result = self
            .hub
            .files()
            .get(id)
            .add_scope(Scope::Full)
            .param("fields", FILE_FIELDS)
            .doit()
            .await
            .map_err(|e| api_error("get", e))?;

        Ok(result.1)
    }

    async fn create_object(&self, metadata: File, media: Option<Media>) -> Result<File> {
        debug!(
            "create_object: {:?} ({:?})",
            metadata.name, metadata.mime_type
        );

        let call = self
            .hub
            .files()
            .create(metadata.clone())
            .add_scope(Scope::Full)
            .param("fields", FILE_FIELDS);

        let result = match media {
            // Folders carry no content; the metadata MIME type makes them folders
            None => {
                let mime = parse_mime(
                    metadata
                        .mime_type
                        .as_deref()
                        .unwrap_or("application/octet-stream"),
                )?;
                call.upload(Cursor::new(Vec::<u8>::new()), mime).await
            }
            Some(media) if media.content.len() > RESUMABLE_UPLOAD_THRESHOLD => {
                debug!("resumable upload of {} bytes", media.content.len());
                call.upload_resumable(Cursor::new(media.content.to_vec()), media.mime_type)
                    .await
            }
            Some(media) => {
                call.upload(Cursor::new(media.content.to_vec()), media.mime_type)
                    .await
            }
        }
        .map_err(|e| api_error("create", e))?;

        Ok(result.1)
    }

    async fn download_media(&self, id: &str) -> Result<Bytes> {
        debug!("download_media: {}", id);

        let response = self
            .hub
            .files()
            .get(id)
            .add_scope(Scope::Full)
            .param("alt", "media")
            .doit()
            .await
            .map_err(|e| api_error("download", e))?;

        let collected = response.0.into_body().collect().await.map_err(|e| {
            StorageError::Transport(format!("Failed to read response body: {}", e))
        })?;

        Ok(collected.to_bytes())
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        debug!("delete_object: {}", id);

        self.hub
            .files()
            .delete(id)
            .add_scope(Scope::Full)
            .doit()
            .await
            .map_err(|e| api_error("delete", e))?;

        Ok(())
    }

    async fn create_permission(&self, object_id: &str, permission: Permission) -> Result<()> {
        debug!(
            "create_permission: {} {:?}/{:?}",
            object_id, permission.role, permission.type_
        );

        self.hub
            .permissions()
            .create(permission, object_id)
            .add_scope(Scope::Full)
            .doit()
            .await
            .map_err(|e| api_error("permission", e))?;

        Ok(())
    }
}
