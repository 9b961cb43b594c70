// Error taxonomy for the worker. Fetch failures are classified so the
// handler can log the distinct kind while treating them all as a trigger
// for the fallback result; job failures carry an explicit retryable flag
// that the runtime shell translates into the orchestrator's failure report.

use thiserror::Error;

/// A failure of the provider read path. All variants trigger the fallback
/// result; the distinction exists for retry classification and logging.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The per-attempt timeout elapsed. Transient, retried.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure (refused, reset, DNS). Transient, retried.
    #[error("connection error: {0}")]
    Connection(String),

    /// Non-2xx response outside the retryable set, or a retryable status
    /// that persisted past the retry budget.
    #[error("upstream returned HTTP {0}")]
    Http(u16),

    /// Response body was not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The resource path parameter was rejected before any request was made.
    #[error("invalid resource identifier: {0}")]
    InvalidResource(String),
}

impl FetchError {
    /// Short classification tag used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout => "timeout",
            FetchError::Connection(_) => "connection_error",
            FetchError::Http(_) => "http_error",
            FetchError::Decode(_) => "decode_error",
            FetchError::InvalidResource(_) => "invalid_resource",
        }
    }
}

/// The provider payload did not have the required shape. The offending
/// payload is retained for diagnostic logging and never re-thrown past the
/// job handler boundary.
#[derive(Debug, Error)]
#[error("invalid payload shape: {reason}")]
pub struct InvalidShape {
    pub reason: String,
    pub payload: serde_json::Value,
}

impl InvalidShape {
    pub fn new(reason: impl Into<String>, payload: &serde_json::Value) -> Self {
        Self {
            reason: reason.into(),
            payload: payload.clone(),
        }
    }
}

/// A missing or malformed setting detected at startup. Fatal; the process
/// must not enter the receive loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("setting {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// A handler-level failure reported back to the orchestrator.
///
/// `retryable` controls whether the job is failed with remaining retries
/// (so the orchestrator redelivers it) or with zero retries (raising an
/// incident on the orchestrator side).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct JobFailure {
    pub message: String,
    pub retryable: bool,
}

impl JobFailure {
    /// A failure the orchestrator should redeliver.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure that re-running cannot fix.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}
