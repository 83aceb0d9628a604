use std::time::Duration;

use stt_batch_api_client::JobControlError;
use stt_batch_core::MalformedLocationError;
use stt_batch_storage::StorageError;

use crate::lifecycle::LifecycleState;

/// Reasons a run stops early. Every variant leaves the lifecycle `Aborted`,
/// except `InvalidTransition`, which leaves the state untouched.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Job control call failed: {0}")]
    JobControl(#[from] JobControlError),

    #[error(transparent)]
    Location(#[from] MalformedLocationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cannot {operation} while lifecycle is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("Polling cancelled after {attempts} status checks")]
    Cancelled { attempts: u32 },

    #[error("Polling deadline of {deadline:?} exceeded after {attempts} status checks")]
    DeadlineExceeded { deadline: Duration, attempts: u32 },
}
