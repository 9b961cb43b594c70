// Wire types for the orchestrator gateway REST API.

use serde::{Deserialize, Serialize};
use worker_common::Variables;

/// A job delivered by the orchestrator: a type tag selecting the handler
/// plus the variable mapping that is the job's input payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivatedJob {
    #[serde(rename = "jobKey")]
    pub key: i64,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub retries: i32,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default, rename = "processInstanceKey")]
    pub process_instance_key: Option<i64>,
    #[serde(default, rename = "elementId")]
    pub element_id: Option<String>,
}

/// Request body for job activation (long-poll).
#[derive(Debug, Clone, Serialize)]
pub struct ActivateJobsRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    /// How long an activated job stays locked to this worker, in ms.
    pub timeout: u64,
    #[serde(rename = "maxJobsToActivate")]
    pub max_jobs_to_activate: u32,
    /// Long-poll duration on the server side, in ms.
    #[serde(rename = "requestTimeout")]
    pub request_timeout: u64,
    pub worker: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateJobsResponse {
    #[serde(default)]
    pub jobs: Vec<ActivatedJob>,
}

/// Request body reporting job success.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteJobRequest {
    pub variables: Variables,
}

/// Request body reporting job failure with a retryable classification:
/// `retries > 0` asks the orchestrator to redeliver, `retries == 0` raises
/// an incident instead.
#[derive(Debug, Clone, Serialize)]
pub struct FailJobRequest {
    pub retries: i32,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

/// Request body for message publication. Fire-and-forget from the worker's
/// perspective; the orchestrator correlates by `correlation_key`.
#[derive(Debug, Clone, Serialize)]
pub struct PublishMessageRequest {
    pub name: String,
    #[serde(rename = "correlationKey")]
    pub correlation_key: String,
    #[serde(rename = "timeToLive")]
    pub time_to_live: u64,
    pub variables: Variables,
}
