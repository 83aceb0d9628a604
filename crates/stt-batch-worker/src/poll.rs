//! Fixed-interval waiting between status checks.
//!
//! Every wait is the same length; there is no backoff. The wait ends early
//! when the cancellation token fires or the optional deadline is reached.

use std::time::Duration;

use stt_batch_core::JobState;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Default wait between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Overall limit measured from the first status check. `None` polls until a
    /// terminal state, a failed check, or cancellation.
    pub deadline: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

/// Terminal state reached by the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub state: JobState,
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    Elapsed,
    Cancelled,
    DeadlineExceeded,
}

/// Sleep until the next status check is due.
pub(crate) async fn wait_for_next_attempt(
    config: &PollConfig,
    polling_started: Instant,
    cancel: &CancellationToken,
) -> Wait {
    let (wait, hits_deadline) = match config.deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_sub(polling_started.elapsed());
            if remaining <= config.interval {
                (remaining, true)
            } else {
                (config.interval, false)
            }
        }
        None => (config.interval, false),
    };

    tokio::select! {
        _ = cancel.cancelled() => Wait::Cancelled,
        _ = sleep(wait) => {
            if hits_deadline {
                Wait::DeadlineExceeded
            } else {
                Wait::Elapsed
            }
        }
    }
}
