//! stt-batch: run speech-to-text batch jobs from the command line.
//!
//! Set STT_API_SUBSCRIPTION_KEY (or API_SUBSCRIPTION_KEY) and optionally
//! STT_API_URL. A `.env` file in the working directory is read if present.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use stt_batch_api_client::{ApiClient, JobApi};
use stt_batch_cli::{
    exit_code_for, init_tracing, render_failures, render_summary, EXIT_COMPLETED,
    EXIT_JOB_FAILED,
};
use stt_batch_core::{BatchConfig, StorageLocation};
use stt_batch_storage::{AzureSasProvider, TransferClient, TransferOptions};
use stt_batch_worker::{JobLifecycle, LifecycleConfig};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "stt-batch", about = "Speech-to-text batch job runner")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload audio, run a job to completion and download the outputs
    Run {
        /// Audio files to transcribe (defaults to STT_INPUT_FILES)
        files: Vec<PathBuf>,
        /// Language code, e.g. hi-IN
        #[arg(long)]
        language: Option<String>,
        /// Directory for downloaded outputs
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Maximum transfers in flight per batch
        #[arg(long)]
        max_concurrency: Option<usize>,
        /// Seconds between status checks
        #[arg(long)]
        poll_interval_secs: Option<u64>,
        /// Give up polling after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Check the state of an existing job
    Status {
        job_id: String,
    },
    /// Download everything under a storage URL
    Fetch {
        /// SAS-scoped storage URL, e.g. a job's output_storage_path
        storage_url: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = BatchConfig::from_env().context("Failed to load configuration")?;

    let code = match cli.command {
        Commands::Run {
            files,
            language,
            output_dir,
            max_concurrency,
            poll_interval_secs,
            deadline_secs,
        } => {
            if !files.is_empty() {
                config.input_files = files;
            }
            if let Some(language) = language {
                config.language_code = language;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if max_concurrency.is_some() {
                config.max_concurrency = max_concurrency;
            }
            if let Some(secs) = poll_interval_secs {
                config.poll_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = deadline_secs {
                config.poll_deadline = Some(Duration::from_secs(secs));
            }
            config.validate_for_run()?;
            run(&config, cli.json).await?
        }
        Commands::Status { job_id } => {
            config.validate()?;
            status(&config, &job_id, cli.json).await?
        }
        Commands::Fetch {
            storage_url,
            output_dir,
        } => {
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            fetch(&config, &storage_url, cli.json).await?
        }
    };

    Ok(ExitCode::from(code))
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current status check");
            token.cancel();
        }
    });
}

async fn run(config: &BatchConfig, json: bool) -> anyhow::Result<u8> {
    let api = ApiClient::from_config(config)?;
    let mut lifecycle = JobLifecycle::new(
        Arc::new(api),
        Arc::new(AzureSasProvider::new()),
        LifecycleConfig::from_batch_config(config),
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = lifecycle.run(&cancel).await;
    let code = exit_code_for(&result);

    match &result {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report.summary())?);
            } else {
                print!("{}", render_summary(&report.summary()));
                let mut failures = render_failures(&report.uploads);
                if let Some(downloads) = &report.downloads {
                    failures.push_str(&render_failures(downloads));
                }
                if !failures.is_empty() {
                    println!("\nFailed transfers:");
                    print!("{}", failures);
                }
            }
        }
        Err(e) => {
            eprintln!("Run aborted in state {}: {}", lifecycle.state(), e);
        }
    }

    Ok(code)
}

async fn status(config: &BatchConfig, job_id: &str, json: bool) -> anyhow::Result<u8> {
    let api = ApiClient::from_config(config)?;
    let response = api
        .job_status(job_id)
        .await
        .with_context(|| format!("Failed to get status of job {}", job_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}: {}", job_id, response.job_state);
    }
    Ok(EXIT_COMPLETED)
}

async fn fetch(config: &BatchConfig, storage_url: &str, json: bool) -> anyhow::Result<u8> {
    let location = StorageLocation::parse(storage_url)?;
    let client = TransferClient::new(
        Arc::new(AzureSasProvider::new()),
        location,
        TransferOptions {
            max_concurrency: config.max_concurrency,
        },
    )?;

    let names = client.list_objects().await?;
    let downloads = client.download_batch(&names, &config.output_dir).await;

    if json {
        let summary = serde_json::json!({
            "listed": names.len(),
            "succeeded": downloads.succeeded(),
            "failed": downloads.failed(),
            "bytes": downloads.bytes_transferred(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Downloaded {}/{} objects to {}",
            downloads.succeeded(),
            names.len(),
            config.output_dir.display()
        );
        print!("{}", render_failures(&downloads));
    }

    Ok(if downloads.failed() == 0 {
        EXIT_COMPLETED
    } else {
        EXIT_JOB_FAILED
    })
}
