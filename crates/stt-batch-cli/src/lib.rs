use std::fmt::Write as _;

use stt_batch_storage::BatchResult;
use stt_batch_worker::{LifecycleError, RunReport, RunSummary};

/// Exit status when the job completed and outputs were fetched.
pub const EXIT_COMPLETED: u8 = 0;
/// Exit status when the job reached `Failed`.
pub const EXIT_JOB_FAILED: u8 = 1;
/// Exit status when the run was aborted before a terminal state.
pub const EXIT_ABORTED: u8 = 2;

pub fn exit_code_for(result: &Result<RunReport, LifecycleError>) -> u8 {
    match result {
        Ok(report) if report.is_completed() => EXIT_COMPLETED,
        Ok(_) => EXIT_JOB_FAILED,
        Err(_) => EXIT_ABORTED,
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Plain-text table for a finished run.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Job {} ===\n", summary.job_id);
    let _ = writeln!(out, "{:<14} {}", "State:", summary.job_state);
    let _ = writeln!(out, "{:<14} {}", "Status checks:", summary.poll_attempts);
    let _ = writeln!(
        out,
        "{:<14} {} ok, {} failed, {} bytes",
        "Uploaded:", summary.uploaded.succeeded, summary.uploaded.failed, summary.uploaded.bytes
    );
    match &summary.downloaded {
        Some(downloaded) => {
            let _ = writeln!(
                out,
                "{:<14} {} ok, {} failed, {} bytes",
                "Downloaded:", downloaded.succeeded, downloaded.failed, downloaded.bytes
            );
        }
        None => {
            let _ = writeln!(out, "{:<14} skipped", "Downloaded:");
        }
    }
    out
}

/// One line per failed item, or an empty string when the batch was clean.
pub fn render_failures(batch: &BatchResult) -> String {
    let mut out = String::new();
    for failure in batch.failures() {
        let _ = writeln!(
            out,
            "  {:<8} {:<40} {}",
            failure.direction,
            truncate_string(&failure.object_name, 40),
            failure.source
        );
    }
    out
}

/// Initialize tracing for the CLI. `STT_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if std::env::var("STT_LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stt_batch_worker::TransferCounts;

    fn summary(downloaded: Option<TransferCounts>) -> RunSummary {
        RunSummary {
            job_id: "job-7".to_string(),
            job_state: "Completed".to_string(),
            uploaded: TransferCounts {
                succeeded: 2,
                failed: 1,
                bytes: 2048,
            },
            downloaded,
            poll_attempts: 4,
        }
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_chars() {
        assert_eq!(truncate_string("नमस्ते दुनिया", 6), "नमस...");
    }

    #[test]
    fn summary_lists_both_batches() {
        let text = render_summary(&summary(Some(TransferCounts {
            succeeded: 3,
            failed: 0,
            bytes: 900,
        })));

        assert!(text.contains("=== Job job-7 ==="));
        assert!(text.contains("2 ok, 1 failed, 2048 bytes"));
        assert!(text.contains("3 ok, 0 failed, 900 bytes"));
        assert!(text.contains("Status checks: 4"));
    }

    #[test]
    fn summary_marks_skipped_download() {
        let text = render_summary(&summary(None));
        assert!(text.contains("skipped"));
    }

    #[test]
    fn aborted_run_exit_code() {
        let result: Result<RunReport, LifecycleError> =
            Err(LifecycleError::Cancelled { attempts: 2 });
        assert_eq!(exit_code_for(&result), EXIT_ABORTED);
    }
}
