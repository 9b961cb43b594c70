// worker-common: shared infrastructure for the orchestrator workers.
// Configuration schema, error taxonomy, retry policy, HTTP client factory,
// secret masking, logging setup and variable-mapping helpers.

pub mod config;
pub mod constants;
pub mod errors;
pub mod http_client;
pub mod logging;
pub mod retry;
pub mod secret_masker;
pub mod variables;

pub use config::{AuthMode, WorkerSettings};
pub use errors::{ConfigError, FetchError, InvalidShape, JobFailure};
pub use http_client::HttpClientFactory;
pub use retry::RetryPolicy;
pub use secret_masker::SecretMasker;
pub use variables::{VarUtil, Variables};
