//! Concurrent batch transfer against one storage location at a time.
//!
//! Every batch call fans out one task per item and joins them all before
//! returning. Items fail independently: a failed read, put or get marks that
//! item failed, is logged, and never fails the batch. There is no retry.
//!
//! By default every item of a batch runs at once; [`TransferOptions::max_concurrency`]
//! caps the fan-out when set.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, Error as ObjectStoreError, GetOptions, ObjectMeta, ObjectStore,
    PutMode, PutOptions, PutPayload,
};
use stt_batch_core::StorageLocation;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys::{content_type_for, leaf_name, object_name_for_path, validate_object_name};
use crate::traits::{StorageError, StorageResult, StoreProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Upload,
    Download,
}

impl Display for TransferDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransferDirection::Upload => write!(f, "upload"),
            TransferDirection::Download => write!(f, "download"),
        }
    }
}

/// Failure of a single item in a batch.
#[derive(Debug, thiserror::Error)]
#[error("{direction} of {object_name} failed: {source}")]
pub struct TransferItemError {
    pub object_name: String,
    pub direction: TransferDirection,
    #[source]
    pub source: StorageError,
}

#[derive(Debug)]
pub enum TransferOutcome {
    Pending,
    Success { bytes: u64 },
    Failure(TransferItemError),
}

/// One file's upload or download.
#[derive(Debug)]
pub struct TransferTask {
    pub direction: TransferDirection,
    /// Source file for uploads, written file for downloads.
    pub local_path: PathBuf,
    pub object_name: String,
    pub outcome: TransferOutcome,
}

impl TransferTask {
    fn pending(direction: TransferDirection, local_path: PathBuf, object_name: String) -> Self {
        Self {
            direction,
            local_path,
            object_name,
            outcome: TransferOutcome::Pending,
        }
    }

    fn settle(mut self, result: StorageResult<u64>) -> Self {
        self.outcome = match result {
            Ok(bytes) => TransferOutcome::Success { bytes },
            Err(source) => TransferOutcome::Failure(TransferItemError {
                object_name: self.object_name.clone(),
                direction: self.direction,
                source,
            }),
        };
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TransferOutcome::Success { .. })
    }
}

/// Settled tasks of one batch call, in completion order.
#[derive(Debug)]
pub struct BatchResult {
    pub direction: TransferDirection,
    pub tasks: Vec<TransferTask>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn succeeded(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransferItemError> {
        self.tasks.iter().filter_map(|t| match &t.outcome {
            TransferOutcome::Failure(e) => Some(e),
            _ => None,
        })
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.tasks
            .iter()
            .map(|t| match t.outcome {
                TransferOutcome::Success { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    /// Maximum transfers in flight per batch. `None` runs the whole batch at once.
    pub max_concurrency: Option<usize>,
}

#[derive(Clone)]
struct Binding {
    location: StorageLocation,
    store: Arc<dyn ObjectStore>,
}

/// Uploads, lists and downloads objects under the currently bound location.
///
/// Rebinding takes `&mut self`, so it cannot overlap a batch call borrowing
/// the client. Each item task holds its own handle to the binding it was
/// launched with.
pub struct TransferClient {
    provider: Arc<dyn StoreProvider>,
    binding: Binding,
    options: TransferOptions,
}

impl TransferClient {
    pub fn new(
        provider: Arc<dyn StoreProvider>,
        location: StorageLocation,
        options: TransferOptions,
    ) -> StorageResult<Self> {
        let store = provider.connect(&location)?;

        tracing::info!(
            location = %location,
            directory = %location.directory_prefix(),
            "Initialized transfer client"
        );

        Ok(Self {
            provider,
            binding: Binding { location, store },
            options,
        })
    }

    pub fn location(&self) -> &StorageLocation {
        &self.binding.location
    }

    /// Bind to a new location and return the previous one.
    ///
    /// If the provider cannot connect to `location` the old binding is kept.
    pub fn rebind(&mut self, location: StorageLocation) -> StorageResult<StorageLocation> {
        let store = self.provider.connect(&location)?;

        tracing::info!(
            location = %location,
            directory = %location.directory_prefix(),
            "Rebound transfer client"
        );

        let previous = std::mem::replace(&mut self.binding, Binding { location, store });
        Ok(previous.location)
    }

    fn fan_out_limit(&self, items: usize) -> usize {
        self.options.max_concurrency.unwrap_or(items).max(1)
    }

    /// Upload each file under its base name. Never fails as a whole.
    pub async fn upload_batch(&self, local_paths: &[PathBuf], overwrite: bool) -> BatchResult {
        let total = local_paths.len();
        tracing::info!(
            files = total,
            location = %self.binding.location,
            "Starting concurrent upload"
        );

        let tasks: Vec<TransferTask> = stream::iter(local_paths.iter().cloned())
            .map(|path| {
                let binding = self.binding.clone();
                async move { upload_one(binding, path, overwrite).await }
            })
            .buffer_unordered(self.fan_out_limit(total))
            .collect()
            .await;

        let result = BatchResult {
            direction: TransferDirection::Upload,
            tasks,
        };

        tracing::info!(
            succeeded = result.succeeded(),
            total = total,
            "Concurrent upload completed: {}/{} files uploaded successfully",
            result.succeeded(),
            total
        );

        result
    }

    /// Base names of every object under the directory prefix.
    ///
    /// The listing is fully materialised before returning.
    pub async fn list_objects(&self) -> StorageResult<Vec<String>> {
        let prefix = self.binding.location.directory_prefix();
        let prefix_path = (!prefix.is_empty()).then(|| ObjectPath::from(prefix));

        let objects: Vec<ObjectMeta> = self
            .binding
            .store
            .list(prefix_path.as_ref())
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    location = %self.binding.location,
                    "Listing objects failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let names: Vec<String> = objects
            .iter()
            .filter_map(|meta| leaf_name(meta.location.as_ref()).map(str::to_string))
            .collect();

        tracing::info!(count = names.len(), location = %self.binding.location, "Listed objects");
        for name in &names {
            tracing::info!(file = %name, "Found object");
        }

        Ok(names)
    }

    /// Download each named object into `destination_dir`. Never fails as a whole.
    pub async fn download_batch(
        &self,
        object_names: &[String],
        destination_dir: &Path,
    ) -> BatchResult {
        let total = object_names.len();
        tracing::info!(
            files = total,
            destination = %destination_dir.display(),
            "Starting concurrent download"
        );

        let tasks: Vec<TransferTask> = stream::iter(object_names.iter().cloned().enumerate())
            .map(|(index, name)| {
                let binding = self.binding.clone();
                let destination_dir = destination_dir.to_path_buf();
                async move { download_one(binding, name, destination_dir, index).await }
            })
            .buffer_unordered(self.fan_out_limit(total))
            .collect()
            .await;

        let result = BatchResult {
            direction: TransferDirection::Download,
            tasks,
        };

        tracing::info!(
            succeeded = result.succeeded(),
            total = total,
            "Download completed for {}/{} files",
            result.succeeded(),
            total
        );

        result
    }
}

impl Debug for TransferClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TransferClient")
            .field("location", &self.binding.location)
            .field("options", &self.options)
            .finish()
    }
}

async fn upload_one(binding: Binding, path: PathBuf, overwrite: bool) -> TransferTask {
    let start = Instant::now();

    let name = match object_name_for_path(&path) {
        Ok(name) => name,
        Err(e) => {
            tracing::error!(file = %path.display(), error = %e, "Upload failed");
            let display = path.display().to_string();
            return TransferTask::pending(TransferDirection::Upload, path, display).settle(Err(e));
        }
    };

    let key = binding.location.object_key(&name);
    let task = TransferTask::pending(TransferDirection::Upload, path.clone(), name.clone());

    let result = async {
        let data = fs::read(&path).await?;
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type_for(&name).into());

        let options = PutOptions {
            mode: if overwrite {
                PutMode::Overwrite
            } else {
                PutMode::Create
            },
            attributes,
            ..Default::default()
        };

        binding
            .store
            .put_opts(
                &ObjectPath::from(key.clone()),
                PutPayload::from(Bytes::from(data)),
                options,
            )
            .await
            .map_err(|e| match e {
                ObjectStoreError::AlreadyExists { .. } => StorageError::AlreadyExists(key.clone()),
                other => StorageError::UploadFailed(other.to_string()),
            })?;

        Ok::<u64, StorageError>(size)
    }
    .await;

    match &result {
        Ok(size) => tracing::info!(
            file = %name,
            key = %key,
            content_type = content_type_for(&name),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File uploaded successfully"
        ),
        Err(e) => tracing::error!(
            file = %name,
            key = %key,
            error = %e,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload failed"
        ),
    }

    task.settle(result)
}

async fn download_one(
    binding: Binding,
    name: String,
    destination_dir: PathBuf,
    index: usize,
) -> TransferTask {
    let start = Instant::now();
    let target = destination_dir.join(&name);
    let task = TransferTask::pending(TransferDirection::Download, target.clone(), name.clone());
    let key = binding.location.object_key(&name);

    let result = async {
        validate_object_name(&name)?;

        let response = binding
            .store
            .get_opts(&ObjectPath::from(key.clone()), GetOptions::default())
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.clone()),
                other => StorageError::DownloadFailed(other.to_string()),
            })?;

        let mut chunks = response.into_stream();
        let mut buffer = Vec::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }

        let temp_path = destination_dir.join(format!(".{}.{}.part", name, index));
        write_atomic(&temp_path, &target, &buffer).await?;

        Ok::<u64, StorageError>(buffer.len() as u64)
    }
    .await;

    match &result {
        Ok(size) => tracing::info!(
            file = %name,
            key = %key,
            path = %target.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File downloaded successfully"
        ),
        Err(e) => tracing::error!(
            file = %name,
            key = %key,
            error = %e,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Download failed"
        ),
    }

    task.settle(result)
}

/// Write to a sibling temp file, then rename over `target`.
async fn write_atomic(temp_path: &Path, target: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).await?;
    }

    let written = async {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(temp_path, target).await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(temp_path).await;
        return Err(StorageError::DownloadFailed(format!(
            "Failed to write {}: {}",
            target.display(),
            e
        )));
    }

    Ok(())
}
