//! Error types for the storage layer.

use theta_model::ModelError;
use theta_registry::RegistryError;
use theta_types::Handle;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while saving or loading.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bad magic or version, truncation, a missing save file, or a
    /// structurally inconsistent body.
    #[error("file format error: {0}")]
    FileFormat(String),

    /// A type tag, blob id or field kind with no registered codec, or
    /// field values that do not match their schema.
    #[error("schema error: {0}")]
    Schema(#[from] ModelError),

    /// A reference whose target never materialized.
    #[error("unresolved reference to {target} from {owner}")]
    UnresolvedReference { target: Handle, owner: Handle },

    /// Registry failure other than entity construction.
    #[error("registry error: {0}")]
    Registry(RegistryError),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file (de)serialization.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking save/load task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),
}

impl From<RegistryError> for StorageError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Model(e) => Self::Schema(e),
            other => Self::Registry(other),
        }
    }
}

impl StorageError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::FileFormat(msg.into())
    }
}
