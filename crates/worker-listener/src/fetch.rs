// CreditScoreFetcher: the single outbound read against the data provider,
// with the bounded retry discipline from the shared RetryPolicy. Retries
// apply only to transient failures and the fixed retryable status set;
// everything else terminates the attempt chain immediately.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Client;
use url::Url;
use worker_common::{FetchError, RetryPolicy};

/// Characters escaped when the customer id is interpolated as a path
/// segment. Includes `/` and `%` so an id can never split the request path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Read-only client for `GET {base}/credit_scores/{customer_id}`.
///
/// Shares one `reqwest::Client` across concurrent invocations; all other
/// state is immutable configuration.
pub struct CreditScoreFetcher {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl CreditScoreFetcher {
    pub fn new(client: Client, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url,
            policy,
        }
    }

    /// Fetch the raw provider payload for one customer.
    ///
    /// Issues up to `max_retries + 1` attempts, sleeping the policy's
    /// backoff between them. Returns the classified failure of the last
    /// attempt when the budget is exhausted.
    pub async fn fetch(&self, customer_id: &str) -> Result<serde_json::Value, FetchError> {
        let url = self.resource_url(customer_id)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            match self.attempt(&url).await {
                Ok(payload) => return Ok(payload),
                Err(error) => {
                    if !self.should_retry(&error) || attempt >= self.policy.total_attempts() {
                        return Err(error);
                    }

                    let delay = self.policy.backoff_delay(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for customer '{}' failed ({}): retrying in {:.1}s",
                        attempt,
                        self.policy.total_attempts(),
                        customer_id,
                        error,
                        delay.as_secs_f64()
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// One bounded attempt: send, triage status, decode.
    async fn attempt(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.policy.timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Decode(e.to_string())
            }
        })
    }

    fn should_retry(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Timeout | FetchError::Connection(_) => true,
            FetchError::Http(status) => self.policy.is_retryable_status(*status),
            FetchError::Decode(_) | FetchError::InvalidResource(_) => false,
        }
    }

    /// Build the resource URL with the customer id escaped as one path
    /// segment. Empty and dot-only ids are rejected outright.
    fn resource_url(&self, customer_id: &str) -> Result<String, FetchError> {
        let trimmed = customer_id.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidResource(
                "customer id is empty".to_string(),
            ));
        }
        if trimmed == "." || trimmed == ".." {
            return Err(FetchError::InvalidResource(format!(
                "customer id {trimmed:?} is not a valid path segment"
            )));
        }

        let encoded = utf8_percent_encode(trimmed, PATH_SEGMENT);
        Ok(format!(
            "{}/credit_scores/{}",
            self.base_url.as_str().trim_end_matches('/'),
            encoded
        ))
    }
}

fn classify_transport(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Connection(error.to_string())
    }
}
