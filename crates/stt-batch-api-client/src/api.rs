//! Job-control calls: initialise, start and status.

use async_trait::async_trait;
use reqwest::StatusCode;
use stt_batch_core::models::{InitJobResponse, JobStatusResponse, StartJobRequest};

use crate::{ApiClient, JobControlError};

const INIT_JOB_PATH: &str = "/speech-to-text/job/init";
const START_JOB_PATH: &str = "/speech-to-text/job";

fn job_status_path(job_id: &str) -> String {
    format!(
        "/speech-to-text/job/{}/status",
        urlencoding::encode(job_id)
    )
}

/// The remote job-control contract.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a job. Success is HTTP 202 with the job id and both storage URLs.
    async fn init_job(&self) -> Result<InitJobResponse, JobControlError>;

    /// Begin processing with the given language. Success is HTTP 200.
    async fn start_job(
        &self,
        job_id: &str,
        language_code: &str,
    ) -> Result<serde_json::Value, JobControlError>;

    /// Current job state. Success is HTTP 200.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, JobControlError>;
}

#[async_trait]
impl JobApi for ApiClient {
    async fn init_job(&self) -> Result<InitJobResponse, JobControlError> {
        tracing::info!("Initializing job");

        let response: InitJobResponse = self
            .post_json(
                "init",
                INIT_JOB_PATH,
                &serde_json::json!({}),
                StatusCode::ACCEPTED,
            )
            .await?;

        tracing::info!(job_id = %response.job_id, "Job initialized");
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn start_job(
        &self,
        job_id: &str,
        language_code: &str,
    ) -> Result<serde_json::Value, JobControlError> {
        let request = StartJobRequest::new(job_id, language_code);
        tracing::debug!(
            body = %serde_json::to_string(&request).unwrap_or_default(),
            "Start job request"
        );

        let response: serde_json::Value = self
            .post_json("start", START_JOB_PATH, &request, StatusCode::OK)
            .await?;

        tracing::debug!(body = %response, "Start job response");
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, JobControlError> {
        let response: JobStatusResponse = self
            .get("status", &job_status_path(job_id), StatusCode::OK)
            .await?;

        tracing::debug!(job_state = %response.job_state, "Job status response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SUBSCRIPTION_KEY_HEADER;
    use mockito::Matcher;

    const KEY: &str = "test-subscription-key";

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(server.url(), KEY, None).unwrap()
    }

    #[tokio::test]
    async fn init_job_accepts_202() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/speech-to-text/job/init")
            .match_header(SUBSCRIPTION_KEY_HEADER, KEY)
            .match_body(Matcher::Json(serde_json::json!({})))
            .with_status(202)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "job_id": "job-1",
                    "input_storage_path": "https://acct.blob.core.windows.net/in/job-1?sig=a",
                    "output_storage_path": "https://acct.blob.core.windows.net/out/job-1?sig=b",
                    "job_state": "Accepted"
                }"#,
            )
            .create_async()
            .await;

        let response = client(&server).init_job().await.unwrap();

        assert_eq!(response.job_id, "job-1");
        assert!(response.output_storage_path.contains("/out/job-1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn init_job_rejects_other_success_codes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/speech-to-text/job/init")
            .with_status(200)
            .with_body(r#"{"job_id":"job-1","input_storage_path":"x","output_storage_path":"y"}"#)
            .create_async()
            .await;

        let Err(err) = client(&server).init_job().await else {
            panic!("init should fail on a non-202 status");
        };

        assert!(matches!(
            err,
            JobControlError::UnexpectedStatus {
                operation: "init",
                status: 200,
                expected: 202,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn start_job_sends_language_parameter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/speech-to-text/job")
            .match_header(SUBSCRIPTION_KEY_HEADER, KEY)
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "job_id": "job-1",
                "job_parameters": { "language_code": "hi-IN" }
            })))
            .with_status(200)
            .with_body(r#"{"job_id":"job-1","job_state":"Running"}"#)
            .create_async()
            .await;

        let response = client(&server).start_job("job-1", "hi-IN").await.unwrap();

        assert_eq!(response["job_state"], "Running");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn start_job_error_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/speech-to-text/job")
            .with_status(400)
            .with_body(r#"{"error":"invalid language_code"}"#)
            .create_async()
            .await;

        let err = client(&server).start_job("job-1", "xx").await.unwrap_err();

        match err {
            JobControlError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid language_code"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn job_status_reads_state() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/speech-to-text/job/job-1/status")
            .match_header(SUBSCRIPTION_KEY_HEADER, KEY)
            .with_status(200)
            .with_body(r#"{"job_id":"job-1","job_state":"Completed"}"#)
            .create_async()
            .await;

        let response = client(&server).job_status("job-1").await.unwrap();

        assert_eq!(response.job_state, "Completed");
        assert!(response.state().is_terminal());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn job_status_decode_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/speech-to-text/job/job-1/status")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server).job_status("job-1").await.unwrap_err();
        assert!(matches!(err, JobControlError::Decode { operation: "status", .. }));
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let client = ApiClient::new("http://127.0.0.1:1", KEY, None).unwrap();

        let err = client.job_status("job-1").await.unwrap_err();
        assert!(matches!(err, JobControlError::Transport { operation: "status", .. }));
    }

    #[test]
    fn status_path_encodes_job_id() {
        assert_eq!(
            job_status_path("job 1/x"),
            "/speech-to-text/job/job%201%2Fx/status"
        );
    }
}
