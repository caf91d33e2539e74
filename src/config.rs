//! Configuration parsing and structures

use std::path::PathBuf;

use serde::Deserialize;

use crate::env::expand_with;
use crate::permission::{PermissionSet, RawPermission};

/// Environment variable holding an inline service account key
pub const KEY_FILE_CONTENTS_ENV: &str = "GOOGLE_DRIVE_STORAGE_JSON_KEY_FILE_CONTENTS";

// =============================================================================
// Raw Config (Deserialized from YAML)
// =============================================================================

/// Raw configuration as deserialized from YAML.
/// This is converted to `Config` via `resolve()`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storage backend settings
    #[serde(default)]
    pub storage: RawStorageConfig,
}

/// Storage section before credential resolution and validation
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Path to a service account JSON key
    pub key_file: Option<String>,

    /// Inline service account JSON key
    pub key_file_contents: Option<String>,

    /// Account to impersonate through domain-wide delegation
    pub user_email: Option<String>,

    /// Folder path prepended to every saved name
    pub root_prefix: Option<String>,

    /// Grants applied to every uploaded file (default: anyone may read)
    pub permissions: Option<Vec<RawPermission>>,
}

// =============================================================================
// Resolved Config (Ready for use)
// =============================================================================

/// Top-level configuration (resolved from RawConfig)
#[derive(Debug, Clone)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Storage backend settings (fully resolved)
    pub storage: StorageConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Where the service account key comes from
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// JSON key file on disk
    KeyFile(PathBuf),
    /// JSON key content
    KeyContents(String),
}

// Key material must not end up in logs
impl std::fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialsSource::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            CredentialsSource::KeyContents(_) => f.write_str("KeyContents(<redacted>)"),
        }
    }
}

/// Storage backend configuration (fully resolved)
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub credentials: CredentialsSource,

    /// Account to impersonate through domain-wide delegation
    pub user_email: Option<String>,

    /// Folder path prepended to every saved name.
    ///
    /// Only `save` applies it; lookups use the caller's path as given.
    pub root_prefix: Option<String>,

    pub permissions: PermissionSet,
}

impl StorageConfig {
    /// Configuration for a key file with default options
    pub fn with_key_file(path: impl Into<PathBuf>) -> Self {
        Self {
            credentials: CredentialsSource::KeyFile(path.into()),
            user_email: None,
            root_prefix: None,
            permissions: PermissionSet::default(),
        }
    }
}

// =============================================================================
// Resolution Logic
// =============================================================================

impl RawConfig {
    /// Resolve raw config using the process environment
    pub fn resolve(self) -> Result<Config, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve raw config, reading environment variables through `lookup`
    pub fn resolve_with<F>(self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let RawConfig { logging, storage } = self;
        let expand = |value: Option<String>| -> Result<Option<String>, ConfigError> {
            value.map(|v| expand_with(&v, &lookup)).transpose()
        };

        // Precedence: key file, inline key, then the environment fallback
        let credentials = if let Some(path) = expand(storage.key_file)? {
            CredentialsSource::KeyFile(PathBuf::from(path))
        } else if let Some(json) = expand(storage.key_file_contents)? {
            CredentialsSource::KeyContents(json)
        } else if let Some(json) = lookup(KEY_FILE_CONTENTS_ENV).filter(|v| !v.is_empty()) {
            CredentialsSource::KeyContents(json)
        } else {
            return Err(ConfigError::ValidationError(format!(
                "No service account key: set storage.key_file, storage.key_file_contents \
                 or the {} environment variable",
                KEY_FILE_CONTENTS_ENV
            )));
        };

        let permissions = match storage.permissions {
            Some(raw) => PermissionSet::from_raw(raw)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?,
            None => PermissionSet::default(),
        };

        Ok(Config {
            logging,
            storage: StorageConfig {
                credentials,
                user_email: expand(storage.user_email)?,
                root_prefix: expand(storage.root_prefix)?,
                permissions,
            },
        })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        raw.resolve()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let CredentialsSource::KeyFile(path) = &self.storage.credentials {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "storage.key_file cannot be empty".to_string(),
                ));
            }
        }

        if let Some(email) = &self.storage.user_email {
            if !email.contains('@') {
                return Err(ConfigError::ValidationError(format!(
                    "storage.user_email is not an e-mail address: {:?}",
                    email
                )));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
