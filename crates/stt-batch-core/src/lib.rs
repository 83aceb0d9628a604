//! Speech-to-text batch core library
//!
//! Storage location parsing, job models and run configuration shared by the
//! storage, API client, worker and CLI crates.

pub mod config;
pub mod error;
pub mod location;
pub mod models;

// Re-export commonly used types
pub use config::BatchConfig;
pub use error::MalformedLocationError;
pub use location::StorageLocation;
pub use models::{JobDescriptor, JobState};
