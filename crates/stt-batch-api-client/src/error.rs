/// Any non-success outcome of a job-control call. Fatal for the run; never retried.
#[derive(Debug, thiserror::Error)]
pub enum JobControlError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned status {status} (expected {expected}): {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        expected: u16,
        body: String,
    },

    #[error("Failed to parse {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl JobControlError {
    /// Name of the job-control call that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            JobControlError::ClientBuild(_) => "client",
            JobControlError::Transport { operation, .. }
            | JobControlError::UnexpectedStatus { operation, .. }
            | JobControlError::Decode { operation, .. } => operation,
        }
    }
}
