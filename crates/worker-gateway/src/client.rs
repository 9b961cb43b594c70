// GatewayClient: the narrow contract the workers consume from the
// orchestrator (activate / complete / fail / publish), plus the REST
// implementation over reqwest with bearer auth.

use crate::auth::CredentialProvider;
use crate::types::{
    ActivateJobsRequest, ActivateJobsResponse, ActivatedJob, CompleteJobRequest, FailJobRequest,
    PublishMessageRequest,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use worker_common::{SecretMasker, Variables};

/// Extra client-side allowance on top of the server-side long-poll timeout.
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Time-to-live attached to published messages (ms).
const MESSAGE_TTL_MS: u64 = 60_000;

/// A failed gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response.
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-success status. The body has been
    /// masked against registered secrets before being stored here.
    #[error("gateway returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Obtaining credentials failed.
    #[error("gateway authentication failed: {0}")]
    Auth(String),
}

/// The job-subscription and message-publish interface of the orchestrator.
///
/// This is the seam between the workers and the external engine; tests
/// substitute an in-memory implementation.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Long-poll for jobs of the given type. An empty vec means the poll
    /// timed out with no work available.
    async fn activate_jobs(
        &self,
        request: &ActivateJobsRequest,
    ) -> Result<Vec<ActivatedJob>, GatewayError>;

    /// Report job success with the result variable mapping.
    async fn complete_job(&self, job_key: i64, variables: Variables)
        -> Result<(), GatewayError>;

    /// Report job failure. `retries` is the count left for the orchestrator
    /// to redeliver; zero raises an incident instead.
    async fn fail_job(
        &self,
        job_key: i64,
        retries: i32,
        error_message: &str,
    ) -> Result<(), GatewayError>;

    /// Publish a correlation message. Fire-and-forget: success only means
    /// the gateway accepted it.
    async fn publish_message(
        &self,
        name: &str,
        correlation_key: &str,
        variables: Variables,
    ) -> Result<(), GatewayError>;
}

/// REST implementation of [`GatewayClient`].
pub struct RestGatewayClient {
    http: Client,
    base_url: Url,
    credentials: CredentialProvider,
    masker: SecretMasker,
}

impl RestGatewayClient {
    pub fn new(
        http: Client,
        base_url: Url,
        credentials: CredentialProvider,
        masker: SecretMasker,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            masker,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// POST a JSON body with bearer auth, treating any non-success status
    /// as a `GatewayError::Http` with a masked body.
    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = self.http.post(self.endpoint(path)).json(body);

        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        if let Some(token) = self.credentials.bearer_token(&self.http).await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: self.masker.mask(&body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl GatewayClient for RestGatewayClient {
    async fn activate_jobs(
        &self,
        request: &ActivateJobsRequest,
    ) -> Result<Vec<ActivatedJob>, GatewayError> {
        // The long poll outlives the client's default timeout.
        let timeout = Duration::from_millis(request.request_timeout) + LONG_POLL_GRACE;

        let response = self
            .post_json("v2/jobs/activation", request, Some(timeout))
            .await?;

        // 204 means the long poll expired without work.
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let activated: ActivateJobsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("malformed activation response: {e}")))?;

        Ok(activated.jobs)
    }

    async fn complete_job(
        &self,
        job_key: i64,
        variables: Variables,
    ) -> Result<(), GatewayError> {
        let body = CompleteJobRequest { variables };
        self.post_json(&format!("v2/jobs/{job_key}/completion"), &body, None)
            .await?;
        Ok(())
    }

    async fn fail_job(
        &self,
        job_key: i64,
        retries: i32,
        error_message: &str,
    ) -> Result<(), GatewayError> {
        let body = FailJobRequest {
            retries,
            error_message: error_message.to_string(),
        };
        self.post_json(&format!("v2/jobs/{job_key}/failure"), &body, None)
            .await?;
        Ok(())
    }

    async fn publish_message(
        &self,
        name: &str,
        correlation_key: &str,
        variables: Variables,
    ) -> Result<(), GatewayError> {
        let body = PublishMessageRequest {
            name: name.to_string(),
            correlation_key: correlation_key.to_string(),
            time_to_live: MESSAGE_TTL_MS,
            variables,
        };
        self.post_json("v2/messages/publication", &body, None)
            .await?;

        tracing::info!(
            "Published message '{}' with correlation key '{}'",
            name,
            correlation_key
        );
        Ok(())
    }
}
