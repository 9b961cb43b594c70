// HttpClientFactory: builds the process-wide reqwest clients. The client is
// cheap to clone and safe for concurrent use, so one instance per concern
// (provider fetch, gateway) is constructed at startup and shared.

use crate::constants;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

/// Connect timeout applied to every client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle keep-alive for pooled connections.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// Create a client for the provider read path.
    ///
    /// No overall timeout is set here; the per-attempt timeout comes from
    /// the retry policy and is applied per request.
    pub fn create_provider_client() -> Result<Client> {
        Self::builder()
            .build()
            .context("Failed to build provider HTTP client")
    }

    /// Create a client for the orchestrator gateway. `request_timeout`
    /// bounds every call except job activation, which passes its own
    /// long-poll timeout per request.
    pub fn create_gateway_client(request_timeout: Duration) -> Result<Client> {
        Self::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build gateway HTTP client")
    }

    fn builder() -> reqwest::ClientBuilder {
        Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .user_agent(format!(
                "{}/{}",
                constants::PACKAGE_NAME,
                constants::VERSION
            ))
    }
}
