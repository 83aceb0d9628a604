//! Drives one batch job from creation to downloaded results.
//!
//! ```text
//! Uninitialized -> Initialized -> Started -> Polling -> Completed
//!                                                    -> Failed
//! any non-terminal state -> Aborted
//! ```
//!
//! Uploads and downloads are best-effort: item failures are reported in the
//! batch results and never abort the run. Job-control failures, malformed
//! storage locations, cancellation and an expired polling deadline abort it.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use stt_batch_api_client::JobApi;
use stt_batch_core::{BatchConfig, JobDescriptor, JobState};
use stt_batch_storage::{StoreProvider, TransferClient, TransferOptions};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::LifecycleError;
use crate::poll::{wait_for_next_attempt, PollConfig, PollOutcome, Wait};
use crate::report::RunReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Started,
    Polling,
    Completed,
    Failed,
    Aborted,
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            LifecycleState::Uninitialized => "Uninitialized",
            LifecycleState::Initialized => "Initialized",
            LifecycleState::Started => "Started",
            LifecycleState::Polling => "Polling",
            LifecycleState::Completed => "Completed",
            LifecycleState::Failed => "Failed",
            LifecycleState::Aborted => "Aborted",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub language_code: String,
    pub input_files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub poll: PollConfig,
    pub transfer: TransferOptions,
}

impl LifecycleConfig {
    pub fn from_batch_config(config: &BatchConfig) -> Self {
        Self {
            language_code: config.language_code.clone(),
            input_files: config.input_files.clone(),
            output_dir: config.output_dir.clone(),
            poll: PollConfig {
                interval: config.poll_interval,
                deadline: config.poll_deadline,
            },
            transfer: TransferOptions {
                max_concurrency: config.max_concurrency,
            },
        }
    }
}

pub struct JobLifecycle {
    api: Arc<dyn JobApi>,
    provider: Arc<dyn StoreProvider>,
    config: LifecycleConfig,
    state: LifecycleState,
}

impl JobLifecycle {
    pub fn new(
        api: Arc<dyn JobApi>,
        provider: Arc<dyn StoreProvider>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            api,
            provider,
            config,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    fn expect_state(
        &self,
        expected: LifecycleState,
        operation: &'static str,
    ) -> Result<(), LifecycleError> {
        if self.state != expected {
            return Err(LifecycleError::InvalidTransition {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn abort(&mut self, error: impl Into<LifecycleError>) -> LifecycleError {
        let error = error.into();
        tracing::error!(error = %error, previous_state = %self.state, "Job run aborted");
        self.state = LifecycleState::Aborted;
        error
    }

    /// Create the remote job and parse both storage locations.
    pub async fn initialize(&mut self) -> Result<JobDescriptor, LifecycleError> {
        self.expect_state(LifecycleState::Uninitialized, "initialize")?;

        let response = match self.api.init_job().await {
            Ok(response) => response,
            Err(e) => return Err(self.abort(e)),
        };
        let job = JobDescriptor::from_init_response(&response).map_err(|e| self.abort(e))?;

        tracing::info!(
            job_id = %job.job_id,
            input = %job.input_location,
            output = %job.output_location,
            "Job initialized"
        );
        self.state = LifecycleState::Initialized;
        Ok(job)
    }

    /// Ask the service to begin processing the uploaded inputs.
    pub async fn start(&mut self, job_id: &str, language_code: &str) -> Result<(), LifecycleError> {
        self.expect_state(LifecycleState::Initialized, "start")?;

        if let Err(e) = self.api.start_job(job_id, language_code).await {
            return Err(self.abort(e));
        }

        tracing::info!(job_id, language_code, "Job started");
        self.state = LifecycleState::Started;
        Ok(())
    }

    /// One status check. Returns the state string exactly as reported.
    pub async fn poll(&self, job_id: &str) -> Result<String, LifecycleError> {
        let response = self.api.job_status(job_id).await?;
        Ok(response.job_state)
    }

    /// Poll at a fixed interval until the job completes or fails.
    ///
    /// A failed status check aborts immediately; it is not retried.
    pub async fn await_completion(
        &mut self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, LifecycleError> {
        self.expect_state(LifecycleState::Started, "poll")?;
        self.state = LifecycleState::Polling;

        let polling_started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            tracing::info!(job_id, attempt = attempts, "Checking job status");

            let reported = match self.poll(job_id).await {
                Ok(reported) => reported,
                Err(e) => return Err(self.abort(e)),
            };

            let state = JobState::from_reported(&reported);
            match state {
                JobState::Completed => {
                    tracing::info!(job_id, attempts, "Job completed");
                    self.state = LifecycleState::Completed;
                }
                JobState::Failed => {
                    tracing::warn!(job_id, attempts, "Job failed");
                    self.state = LifecycleState::Failed;
                }
                _ => {
                    tracing::info!(job_id, job_state = %reported, "Job still in progress");
                }
            }

            if state.is_terminal() {
                return Ok(PollOutcome {
                    state,
                    attempts,
                    elapsed: polling_started.elapsed(),
                });
            }

            match wait_for_next_attempt(&self.config.poll, polling_started, cancel).await {
                Wait::Elapsed => {}
                Wait::Cancelled => return Err(self.abort(LifecycleError::Cancelled { attempts })),
                Wait::DeadlineExceeded => {
                    let deadline = self.config.poll.deadline.unwrap_or_default();
                    return Err(self.abort(LifecycleError::DeadlineExceeded { deadline, attempts }));
                }
            }
        }
    }

    /// Full run: initialize, upload inputs, start, poll, then fetch outputs
    /// when the job completed.
    #[tracing::instrument(skip_all, fields(files = self.config.input_files.len()))]
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<RunReport, LifecycleError> {
        let mut job = self.initialize().await?;

        let mut transfer = TransferClient::new(
            self.provider.clone(),
            job.input_location.clone(),
            self.config.transfer,
        )
        .map_err(|e| self.abort(e))?;

        let uploads = transfer.upload_batch(&self.config.input_files, true).await;
        if uploads.total() > 0 && uploads.succeeded() == 0 {
            tracing::warn!(job_id = %job.job_id, "No input files were uploaded");
        }

        let language_code = self.config.language_code.clone();
        self.start(&job.job_id, &language_code).await?;
        job.state = JobState::Started;

        let outcome = self.await_completion(&job.job_id, cancel).await?;
        job.state = outcome.state.clone();

        let downloads = if outcome.state == JobState::Completed {
            transfer
                .rebind(job.output_location.clone())
                .map_err(|e| self.abort(e))?;
            let names = transfer.list_objects().await.map_err(|e| self.abort(e))?;
            tracing::info!(job_id = %job.job_id, objects = names.len(), "Downloading job outputs");
            Some(transfer.download_batch(&names, &self.config.output_dir).await)
        } else {
            None
        };

        Ok(RunReport {
            job,
            uploads,
            downloads,
            poll_attempts: outcome.attempts,
        })
    }
}
