// worker-gateway: the narrow client contract against the external workflow
// orchestrator. The engine itself (process model, scheduling, persistence)
// is opaque; the workers only activate jobs, report results and publish
// correlation messages.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::CredentialProvider;
pub use client::{GatewayClient, GatewayError, RestGatewayClient};
pub use types::{ActivateJobsRequest, ActivatedJob};
