use std::io;
use thiserror::Error;

use crate::permission::PermissionError;

/// Main error type for gdrive-storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid permission: {0}")]
    Permission(#[from] PermissionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Drive API error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// True for errors that mean "the remote object does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type alias for gdrive-storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
