//! Orchestration of a speech-to-text batch job.
//!
//! [`JobLifecycle`] creates the remote job, uploads inputs through a
//! [`stt_batch_storage::TransferClient`], starts processing, polls status and
//! downloads outputs once the job completes.

pub mod error;
pub mod lifecycle;
pub mod poll;
pub mod report;

pub use error::LifecycleError;
pub use lifecycle::{JobLifecycle, LifecycleConfig, LifecycleState};
pub use poll::{PollConfig, PollOutcome, DEFAULT_POLL_INTERVAL};
pub use report::{RunReport, RunSummary, TransferCounts};
