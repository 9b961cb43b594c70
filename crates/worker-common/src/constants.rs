// Well-known constants: environment variable names, defaults, process exit
// codes, and the fixed retryable status set for the provider read path.

/// User-agent package name sent with outbound HTTP requests.
pub const PACKAGE_NAME: &str = "credit-worker";

/// Package version baked in at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Environment variable names (canonical schema)
// ---------------------------------------------------------------------------

/// The canonical environment variable for each setting. Older deployments
/// carried legacy aliases for some of these; any alias mapping is a
/// deployment shim, the worker itself reads only these names.
pub mod env_vars {
    /// Orchestrator gateway REST endpoint, e.g. `https://region.zeebe.example.com`.
    pub const GATEWAY_URL: &str = "ZEEBE_GATEWAY_URL";
    /// Credential mode: `none`, `token` or `oauth`.
    pub const AUTH_MODE: &str = "ZEEBE_AUTH_MODE";
    /// Pre-issued bearer token (mode `token`).
    pub const AUTH_TOKEN: &str = "ZEEBE_AUTH_TOKEN";
    /// OAuth2 client-credentials settings (mode `oauth`).
    pub const CLIENT_ID: &str = "ZEEBE_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "ZEEBE_CLIENT_SECRET";
    pub const AUTHORIZATION_SERVER: &str = "ZEEBE_AUTHORIZATION_SERVER";
    pub const TOKEN_AUDIENCE: &str = "ZEEBE_TOKEN_AUDIENCE";

    /// Base URL of the credit-score data provider.
    pub const PROVIDER_BASE_URL: &str = "PROVIDER_BASE_URL";
    /// Retry budget for the provider read path.
    pub const PROVIDER_MAX_RETRIES: &str = "PROVIDER_MAX_RETRIES";
    /// Exponential backoff factor in seconds.
    pub const PROVIDER_BACKOFF_FACTOR: &str = "PROVIDER_BACKOFF_FACTOR";
    /// Per-attempt timeout in seconds.
    pub const PROVIDER_REQUEST_TIMEOUT: &str = "PROVIDER_REQUEST_TIMEOUT";

    /// Job type tag the credit-score handler subscribes to.
    pub const CREDIT_SCORE_JOB_TYPE: &str = "CREDIT_SCORE_JOB_TYPE";
    /// Job type tag the forwarding handler subscribes to.
    pub const INCOMING_EVENT: &str = "INCOMING_EVENT";
    /// Message name the forwarding handler publishes.
    pub const OUTGOING_EVENT: &str = "OUTGOING_EVENT";

    /// Display name sent with job activations.
    pub const WORKER_NAME: &str = "WORKER_NAME";
    /// Maximum jobs activated (and handled concurrently) per poll.
    pub const WORKER_MAX_JOBS: &str = "WORKER_MAX_JOBS";
}

// ---------------------------------------------------------------------------
// Defaults and bounds
// ---------------------------------------------------------------------------

pub mod defaults {
    pub const PROVIDER_BASE_URL: &str = "http://localhost:3000";
    pub const MAX_RETRIES: u32 = 3;
    pub const BACKOFF_FACTOR: f64 = 1.0;
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const CREDIT_SCORE_JOB_TYPE: &str = "check_credit_score";
    pub const INCOMING_EVENT: &str = "incoming_event";
    pub const OUTGOING_EVENT: &str = "outgoing_event";
    pub const WORKER_NAME: &str = "credit-worker";
    pub const MAX_JOBS: u32 = 8;

    /// Upper bound accepted for the retry budget.
    pub const MAX_RETRIES_LIMIT: u32 = 10;
    /// Bounds accepted for the per-attempt timeout.
    pub const REQUEST_TIMEOUT_MIN_SECS: u64 = 1;
    pub const REQUEST_TIMEOUT_MAX_SECS: u64 = 300;
}

/// Status codes that are retried on the provider read path. Fixed set,
/// applied only to the read-only lookup, never to mutating operations.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

// ---------------------------------------------------------------------------
// Process exit codes
// ---------------------------------------------------------------------------

pub mod return_code {
    pub const SUCCESS: i32 = 0;
    pub const TERMINATED_ERROR: i32 = 1;
    pub const CONFIGURATION_ERROR: i32 = 2;
}
