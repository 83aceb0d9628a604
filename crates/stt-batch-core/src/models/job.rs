use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::MalformedLocationError;
use crate::location::StorageLocation;

/// Job state as reported by the job API.
///
/// Only `Completed` and `Failed` are terminal. Any other reported string keeps
/// the job in progress; unrecognised strings are preserved in `Other` so they
/// can be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Initialized,
    Started,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl JobState {
    /// Map a reported `job_state` string. Matching is exact, as the API reports it.
    pub fn from_reported(state: &str) -> Self {
        match state {
            "Completed" => JobState::Completed,
            "Failed" => JobState::Failed,
            "Running" => JobState::Running,
            "Initialized" => JobState::Initialized,
            "Started" => JobState::Started,
            other => JobState::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobState::Initialized => write!(f, "Initialized"),
            JobState::Started => write!(f, "Started"),
            JobState::Running => write!(f, "Running"),
            JobState::Completed => write!(f, "Completed"),
            JobState::Failed => write!(f, "Failed"),
            JobState::Other(state) => write!(f, "{}", state),
        }
    }
}

/// The remote record of a submitted job and where its files live.
///
/// Not serializable: both locations carry SAS tokens.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_id: String,
    pub input_location: StorageLocation,
    pub output_location: StorageLocation,
    pub state: JobState,
}

impl JobDescriptor {
    /// Build a descriptor from an accepted `init` response.
    pub fn from_init_response(response: &InitJobResponse) -> Result<Self, MalformedLocationError> {
        Ok(Self {
            job_id: response.job_id.clone(),
            input_location: StorageLocation::parse(&response.input_storage_path)?,
            output_location: StorageLocation::parse(&response.output_storage_path)?,
            state: JobState::Initialized,
        })
    }
}

/// Body of a 202 response from `POST /speech-to-text/job/init`.
#[derive(Clone, Deserialize)]
pub struct InitJobResponse {
    pub job_id: String,
    pub input_storage_path: String,
    pub output_storage_path: String,
}

/// Body of `POST /speech-to-text/job`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartJobRequest {
    pub job_id: String,
    pub job_parameters: JobParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobParameters {
    pub language_code: String,
}

impl StartJobRequest {
    pub fn new(job_id: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_parameters: JobParameters {
                language_code: language_code.into(),
            },
        }
    }
}

/// Body of a 200 response from `GET /speech-to-text/job/{job_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_state: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

impl JobStatusResponse {
    pub fn state(&self) -> JobState {
        JobState::from_reported(&self.job_state)
    }
}
