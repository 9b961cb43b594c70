// WorkerSettings: the canonical configuration schema, loaded from the
// environment and validated before the process enters the receive loop.

use crate::constants::{defaults, env_vars};
use crate::errors::ConfigError;
use crate::retry::RetryPolicy;
use std::env;
use std::time::Duration;
use url::Url;

/// Credential mode for the orchestrator gateway.
///
/// There is deliberately no interactive-prompt mode; the credential source
/// is selected unambiguously at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No authentication (insecure local gateway).
    None,
    /// Pre-issued bearer token.
    Token { token: String },
    /// OAuth2 client-credentials exchange.
    OAuth {
        client_id: String,
        client_secret: String,
        authorization_server: String,
        audience: String,
    },
}

/// Validated worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Orchestrator gateway REST endpoint.
    pub gateway_url: Url,
    /// How the gateway client authenticates.
    pub auth: AuthMode,

    /// Base URL of the credit-score provider.
    pub provider_base_url: Url,
    /// Retry discipline for the provider read path.
    pub retry_policy: RetryPolicy,

    /// Job type tag for the credit-score handler.
    pub credit_score_job_type: String,
    /// Job type tag the forwarding handler subscribes to.
    pub incoming_event: String,
    /// Message name the forwarding handler publishes.
    pub outgoing_event: String,

    /// Worker display name sent with activations.
    pub worker_name: String,
    /// Maximum jobs activated (and in flight) per poll.
    pub max_jobs: u32,
}

impl WorkerSettings {
    /// Load settings from the environment.
    ///
    /// Returns `ConfigError` for any missing required value or value that
    /// fails validation. The caller must treat an error as fatal and exit
    /// without entering the receive loop.
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway_url = required(env_vars::GATEWAY_URL)?;
        let gateway_url = parse_url(env_vars::GATEWAY_URL, &gateway_url)?;

        let auth = Self::auth_from_env()?;

        let provider_base_url = env_string(
            env_vars::PROVIDER_BASE_URL,
            defaults::PROVIDER_BASE_URL,
        );
        let provider_base_url = parse_url(env_vars::PROVIDER_BASE_URL, &provider_base_url)?;

        let max_retries = env_parsed(env_vars::PROVIDER_MAX_RETRIES, defaults::MAX_RETRIES)?;
        if max_retries > defaults::MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid {
                name: env_vars::PROVIDER_MAX_RETRIES,
                value: max_retries.to_string(),
                reason: format!("must be at most {}", defaults::MAX_RETRIES_LIMIT),
            });
        }

        let backoff_factor: f64 =
            env_parsed(env_vars::PROVIDER_BACKOFF_FACTOR, defaults::BACKOFF_FACTOR)?;
        if !backoff_factor.is_finite() || backoff_factor < 0.0 {
            return Err(ConfigError::Invalid {
                name: env_vars::PROVIDER_BACKOFF_FACTOR,
                value: backoff_factor.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }

        let timeout_secs: u64 = env_parsed(
            env_vars::PROVIDER_REQUEST_TIMEOUT,
            defaults::REQUEST_TIMEOUT_SECS,
        )?;
        if !(defaults::REQUEST_TIMEOUT_MIN_SECS..=defaults::REQUEST_TIMEOUT_MAX_SECS)
            .contains(&timeout_secs)
        {
            return Err(ConfigError::Invalid {
                name: env_vars::PROVIDER_REQUEST_TIMEOUT,
                value: timeout_secs.to_string(),
                reason: format!(
                    "must be between {} and {} seconds",
                    defaults::REQUEST_TIMEOUT_MIN_SECS,
                    defaults::REQUEST_TIMEOUT_MAX_SECS
                ),
            });
        }

        let retry_policy = RetryPolicy::new(
            max_retries,
            backoff_factor,
            Duration::from_secs(timeout_secs),
        );

        Ok(Self {
            gateway_url,
            auth,
            provider_base_url,
            retry_policy,
            credit_score_job_type: env_string(
                env_vars::CREDIT_SCORE_JOB_TYPE,
                defaults::CREDIT_SCORE_JOB_TYPE,
            ),
            incoming_event: env_string(env_vars::INCOMING_EVENT, defaults::INCOMING_EVENT),
            outgoing_event: env_string(env_vars::OUTGOING_EVENT, defaults::OUTGOING_EVENT),
            worker_name: env_string(env_vars::WORKER_NAME, defaults::WORKER_NAME),
            max_jobs: env_parsed(env_vars::WORKER_MAX_JOBS, defaults::MAX_JOBS)?.max(1),
        })
    }

    /// Read the credential mode. `oauth` requires the full client-credentials
    /// quadruple; partial configuration is rejected rather than guessed at.
    fn auth_from_env() -> Result<AuthMode, ConfigError> {
        let mode = env_string(env_vars::AUTH_MODE, "none");
        match mode.to_ascii_lowercase().as_str() {
            "none" => Ok(AuthMode::None),
            "token" => Ok(AuthMode::Token {
                token: required(env_vars::AUTH_TOKEN)?,
            }),
            "oauth" => Ok(AuthMode::OAuth {
                client_id: required(env_vars::CLIENT_ID)?,
                client_secret: required(env_vars::CLIENT_SECRET)?,
                authorization_server: required(env_vars::AUTHORIZATION_SERVER)?,
                audience: required(env_vars::TOKEN_AUDIENCE)?,
            }),
            other => Err(ConfigError::Invalid {
                name: env_vars::AUTH_MODE,
                value: other.to_string(),
                reason: "expected one of: none, token, oauth".to_string(),
            }),
        }
    }

    /// Secret values that must never appear in log output.
    pub fn secret_values(&self) -> Vec<&str> {
        match &self.auth {
            AuthMode::None => Vec::new(),
            AuthMode::Token { token } => vec![token.as_str()],
            AuthMode::OAuth { client_secret, .. } => vec![client_secret.as_str()],
        }
    }

    /// Log the effective (non-secret) configuration at startup.
    pub fn log_startup(&self) {
        tracing::info!("Gateway URL: {}", self.gateway_url);
        tracing::info!(
            "Auth mode: {}",
            match self.auth {
                AuthMode::None => "none",
                AuthMode::Token { .. } => "token",
                AuthMode::OAuth { .. } => "oauth",
            }
        );
        tracing::info!("Provider base URL: {}", self.provider_base_url);
        tracing::info!(
            "Retry policy: max_retries={} backoff_factor={} timeout={}s",
            self.retry_policy.max_retries,
            self.retry_policy.backoff_factor,
            self.retry_policy.timeout.as_secs()
        );
        tracing::info!("Worker name: {}", self.worker_name);
        tracing::info!("Max concurrent jobs: {}", self.max_jobs);
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn env_string(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

fn env_parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + ToString,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
                name,
                value,
                reason: "failed to parse".to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Env vars are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for name in [
            env_vars::GATEWAY_URL,
            env_vars::AUTH_MODE,
            env_vars::AUTH_TOKEN,
            env_vars::CLIENT_ID,
            env_vars::CLIENT_SECRET,
            env_vars::AUTHORIZATION_SERVER,
            env_vars::TOKEN_AUDIENCE,
            env_vars::PROVIDER_BASE_URL,
            env_vars::PROVIDER_MAX_RETRIES,
            env_vars::PROVIDER_BACKOFF_FACTOR,
            env_vars::PROVIDER_REQUEST_TIMEOUT,
            env_vars::CREDIT_SCORE_JOB_TYPE,
            env_vars::INCOMING_EVENT,
            env_vars::OUTGOING_EVENT,
            env_vars::WORKER_NAME,
            env_vars::WORKER_MAX_JOBS,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn missing_gateway_url_is_fatal() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        let err = WorkerSettings::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(name) if name == env_vars::GATEWAY_URL));
    }

    #[test]
    fn defaults_applied() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var(env_vars::GATEWAY_URL, "http://localhost:8080");

        let settings = WorkerSettings::from_env().unwrap();
        assert_eq!(settings.auth, AuthMode::None);
        assert_eq!(
            settings.provider_base_url.as_str(),
            "http://localhost:3000/"
        );
        assert_eq!(settings.retry_policy.max_retries, 3);
        assert_eq!(settings.retry_policy.timeout, Duration::from_secs(10));
        assert_eq!(settings.credit_score_job_type, "check_credit_score");
        assert_eq!(settings.incoming_event, "incoming_event");
        assert_eq!(settings.outgoing_event, "outgoing_event");
        clear_env();
    }

    #[test]
    fn oauth_mode_requires_full_quadruple() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var(env_vars::GATEWAY_URL, "http://localhost:8080");
        std::env::set_var(env_vars::AUTH_MODE, "oauth");
        std::env::set_var(env_vars::CLIENT_ID, "id");
        std::env::set_var(env_vars::CLIENT_SECRET, "secret");
        // authorization server and audience missing

        let err = WorkerSettings::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        clear_env();
    }

    #[test]
    fn unknown_auth_mode_rejected() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var(env_vars::GATEWAY_URL, "http://localhost:8080");
        std::env::set_var(env_vars::AUTH_MODE, "interactive");

        let err = WorkerSettings::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == env_vars::AUTH_MODE));
        clear_env();
    }

    #[test]
    fn retry_budget_upper_bound() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var(env_vars::GATEWAY_URL, "http://localhost:8080");
        std::env::set_var(env_vars::PROVIDER_MAX_RETRIES, "50");

        let err = WorkerSettings::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { name, .. } if name == env_vars::PROVIDER_MAX_RETRIES)
        );
        clear_env();
    }

    #[test]
    fn secret_values_cover_token_and_client_secret() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var(env_vars::GATEWAY_URL, "http://localhost:8080");
        std::env::set_var(env_vars::AUTH_MODE, "token");
        std::env::set_var(env_vars::AUTH_TOKEN, "s3cr3t-token");

        let settings = WorkerSettings::from_env().unwrap();
        assert_eq!(settings.secret_values(), vec!["s3cr3t-token"]);
        clear_env();
    }
}
