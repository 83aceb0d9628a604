//! Storage abstraction trait
//!
//! A [`StoreProvider`] turns a [`StorageLocation`] into an object store scoped to
//! that location's container and credentials. The transfer client asks its
//! provider for a new store every time it is rebound.

use std::sync::Arc;

use object_store::ObjectStore;
use stt_batch_core::StorageLocation;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Builds object stores bound to a storage location.
///
/// Implementations must not log the location's access token.
pub trait StoreProvider: Send + Sync {
    /// Object store addressing `location`'s container, authorised by its token.
    ///
    /// Keys passed to the returned store are container-relative; the caller
    /// applies the directory prefix.
    fn connect(&self, location: &StorageLocation) -> StorageResult<Arc<dyn ObjectStore>>;
}
