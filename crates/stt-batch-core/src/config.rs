//! Configuration module
//!
//! Process-level settings for a batch run: API endpoint and credential,
//! language, input files, download directory and the polling/transfer knobs.
//! Values come from the environment (a `.env` file is loaded first when present);
//! the CLI overrides individual fields after loading.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.sarvam.ai";
const DEFAULT_LANGUAGE_CODE: &str = "hi-IN";
const DEFAULT_OUTPUT_DIR: &str = "data";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Settings for one orchestration run.
#[derive(Clone)]
pub struct BatchConfig {
    pub api_url: String,
    pub subscription_key: String,
    pub language_code: String,
    pub input_files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
    /// Overall polling deadline. `None` polls until a terminal state.
    pub poll_deadline: Option<Duration>,
    /// Cap on concurrent transfers per batch. `None` launches every transfer at once.
    pub max_concurrency: Option<usize>,
    /// Per-request HTTP timeout. `None` waits indefinitely.
    pub http_timeout: Option<Duration>,
}

impl BatchConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` uses the process environment.
    pub fn from_source<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let subscription_key = get("STT_API_SUBSCRIPTION_KEY")
            .or_else(|| get("API_SUBSCRIPTION_KEY"))
            .unwrap_or_default();

        let input_files = get("STT_INPUT_FILES")
            .map(|files| {
                files
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let poll_interval_secs = match get("STT_POLL_INTERVAL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("STT_POLL_INTERVAL_SECS must be a valid number"))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        let poll_deadline = parse_optional::<u64>(&get, "STT_POLL_DEADLINE_SECS")?
            .map(Duration::from_secs);
        let max_concurrency = parse_optional::<usize>(&get, "STT_MAX_CONCURRENCY")?;
        let http_timeout =
            parse_optional::<u64>(&get, "STT_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            api_url: get("STT_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            subscription_key,
            language_code: get("STT_LANGUAGE_CODE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
            input_files,
            output_dir: get("STT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_deadline,
            max_concurrency,
            http_timeout,
        })
    }

    /// Checks that apply to every command.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.subscription_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "STT_API_SUBSCRIPTION_KEY (or API_SUBSCRIPTION_KEY) must be set"
            ));
        }
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("STT_API_URL must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow::anyhow!("Poll interval must be greater than zero"));
        }
        if self.max_concurrency == Some(0) {
            return Err(anyhow::anyhow!("Max concurrency must be greater than zero"));
        }
        Ok(())
    }

    /// Checks for a full run, which also needs input files.
    pub fn validate_for_run(&self) -> Result<(), anyhow::Error> {
        self.validate()?;
        if self.input_files.is_empty() {
            return Err(anyhow::anyhow!(
                "No input files given. Pass file paths or set STT_INPUT_FILES"
            ));
        }
        Ok(())
    }
}

fn parse_optional<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, anyhow::Error> {
    match get(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        _ => Ok(None),
    }
}

impl Debug for BatchConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BatchConfig")
            .field("api_url", &self.api_url)
            .field("subscription_key", &"<redacted>")
            .field("language_code", &self.language_code)
            .field("input_files", &self.input_files)
            .field("output_dir", &self.output_dir)
            .field("poll_interval", &self.poll_interval)
            .field("poll_deadline", &self.poll_deadline)
            .field("max_concurrency", &self.max_concurrency)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<BatchConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BatchConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_source_behavior() {
        let config = config_from(&[("STT_API_SUBSCRIPTION_KEY", "key")]).unwrap();

        assert_eq!(config.api_url, "https://api.sarvam.ai");
        assert_eq!(config.language_code, "hi-IN");
        assert_eq!(config.output_dir, PathBuf::from("data"));
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.poll_deadline, None);
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.http_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_overrides_and_file_list() {
        let config = config_from(&[
            ("API_SUBSCRIPTION_KEY", "fallback-key"),
            ("STT_API_URL", "http://localhost:8080/"),
            ("STT_INPUT_FILES", "a.wav, b.wav,,"),
            ("STT_POLL_INTERVAL_SECS", "2"),
            ("STT_POLL_DEADLINE_SECS", "600"),
            ("STT_MAX_CONCURRENCY", "4"),
        ])
        .unwrap();

        assert_eq!(config.subscription_key, "fallback-key");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(
            config.input_files,
            vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")]
        );
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.poll_deadline, Some(Duration::from_secs(600)));
        assert_eq!(config.max_concurrency, Some(4));
        assert!(config.validate_for_run().is_ok());
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(config_from(&[("STT_POLL_INTERVAL_SECS", "soon")]).is_err());
        assert!(config_from(&[("STT_MAX_CONCURRENCY", "-1")]).is_err());
    }

    #[test]
    fn validation_failures() {
        let missing_key = config_from(&[]).unwrap();
        assert!(missing_key.validate().is_err());

        let zero_interval =
            config_from(&[("STT_API_SUBSCRIPTION_KEY", "k"), ("STT_POLL_INTERVAL_SECS", "0")])
                .unwrap();
        assert!(zero_interval.validate().is_err());

        let zero_cap =
            config_from(&[("STT_API_SUBSCRIPTION_KEY", "k"), ("STT_MAX_CONCURRENCY", "0")])
                .unwrap();
        assert!(zero_cap.validate().is_err());

        let no_files = config_from(&[("STT_API_SUBSCRIPTION_KEY", "k")]).unwrap();
        assert!(no_files.validate().is_ok());
        assert!(no_files.validate_for_run().is_err());
    }

    #[test]
    fn debug_redacts_subscription_key() {
        let config = config_from(&[("STT_API_SUBSCRIPTION_KEY", "super-secret")]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
    }
}
