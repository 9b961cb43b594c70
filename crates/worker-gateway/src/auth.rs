// Credential provider for the gateway client. Two non-interactive modes:
// a pre-issued bearer token, or an OAuth2 client-credentials exchange with
// in-memory token caching and refresh ahead of expiry.

use crate::client::GatewayError;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use worker_common::config::AuthMode;

/// Refresh the cached OAuth token this long before it actually expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Supplies the bearer token for gateway requests, per the configured
/// credential mode. Safe for concurrent use.
pub struct CredentialProvider {
    mode: AuthMode,
    cached: Mutex<Option<CachedToken>>,
}

impl CredentialProvider {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            cached: Mutex::new(None),
        }
    }

    /// Returns the bearer token to attach, or `None` for an insecure gateway.
    pub async fn bearer_token(&self, client: &Client) -> Result<Option<String>, GatewayError> {
        match &self.mode {
            AuthMode::None => Ok(None),
            AuthMode::Token { token } => Ok(Some(token.clone())),
            AuthMode::OAuth {
                client_id,
                client_secret,
                authorization_server,
                audience,
            } => {
                if let Some(cached) = self.cached.lock().as_ref() {
                    if cached.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                        return Ok(Some(cached.token.clone()));
                    }
                }

                let token = self
                    .exchange_client_credentials(
                        client,
                        client_id,
                        client_secret,
                        authorization_server,
                        audience,
                    )
                    .await?;
                Ok(Some(token))
            }
        }
    }

    /// Perform the OAuth2 client-credentials exchange and cache the result.
    async fn exchange_client_credentials(
        &self,
        client: &Client,
        client_id: &str,
        client_secret: &str,
        authorization_server: &str,
        audience: &str,
    ) -> Result<String, GatewayError> {
        tracing::debug!("Requesting OAuth access token from {}", authorization_server);

        let response = client
            .post(authorization_server)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("audience", audience),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Deliberately drop the body: it may echo the client secret.
            return Err(GatewayError::Auth(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Auth(format!("malformed token response: {e}")))?;

        let expires_in = Duration::from_secs(token_response.expires_in.unwrap_or(300));
        *self.cached.lock() = Some(CachedToken {
            token: token_response.access_token.clone(),
            expires_at: Instant::now() + expires_in,
        });

        Ok(token_response.access_token)
    }
}
