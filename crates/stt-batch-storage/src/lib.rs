//! Speech-to-text batch storage library
//!
//! Concurrent, best-effort transfer of files against one SAS-scoped storage
//! location at a time.
//!
//! # Object key format
//!
//! Object keys are the location's directory prefix joined with a file's base
//! name: `{directory_prefix}/{file_name}`, or just `{file_name}` when the
//! location points at the container root. Listings strip the prefix again and
//! report base names only.

#[cfg(feature = "storage-azure")]
pub mod azure;
pub mod keys;
pub mod memory;
pub mod traits;
pub mod transfer;

// Re-export commonly used types
#[cfg(feature = "storage-azure")]
pub use azure::AzureSasProvider;
pub use memory::MemoryStoreProvider;
pub use traits::{StorageError, StorageResult, StoreProvider};
pub use transfer::{
    BatchResult, TransferClient, TransferDirection, TransferItemError, TransferOptions,
    TransferOutcome, TransferTask,
};
