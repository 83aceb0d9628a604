use serde::Serialize;
use stt_batch_core::{JobDescriptor, JobState};
use stt_batch_storage::BatchResult;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub job: JobDescriptor,
    pub uploads: BatchResult,
    /// Present only when the job completed.
    pub downloads: Option<BatchResult>,
    pub poll_attempts: u32,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.job.state == JobState::Completed
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            job_id: self.job.job_id.clone(),
            job_state: self.job.state.to_string(),
            uploaded: TransferCounts::from(&self.uploads),
            downloaded: self.downloads.as_ref().map(TransferCounts::from),
            poll_attempts: self.poll_attempts,
        }
    }
}

/// Printable outcome of a run. Carries no storage credentials.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub job_id: String,
    pub job_state: String,
    pub uploaded: TransferCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<TransferCounts>,
    pub poll_attempts: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TransferCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl From<&BatchResult> for TransferCounts {
    fn from(batch: &BatchResult) -> Self {
        Self {
            succeeded: batch.succeeded(),
            failed: batch.failed(),
            bytes: batch.bytes_transferred(),
        }
    }
}
