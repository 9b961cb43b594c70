// Message-forwarding handler: extract correlation data from the inbound
// job and republish it under the configured outgoing event name. No local
// retry here - there is no safe partial-success state for a fire-and-forget
// notification, so a publish failure is surfaced as a retryable job failure
// and the orchestrator applies its own redelivery policy.

use crate::worker::JobHandler;
use async_trait::async_trait;
use std::sync::Arc;
use worker_common::{JobFailure, VarUtil, Variables};
use worker_gateway::{ActivatedJob, GatewayClient};

/// Sentinel used when the inbound payload carries no correlation key.
const DEFAULT_CORRELATION_KEY: &str = "default-key";

pub struct MessageForwardHandler {
    gateway: Arc<dyn GatewayClient>,
    outgoing_event: String,
}

impl MessageForwardHandler {
    pub fn new(gateway: Arc<dyn GatewayClient>, outgoing_event: String) -> Self {
        Self {
            gateway,
            outgoing_event,
        }
    }
}

#[async_trait]
impl JobHandler for MessageForwardHandler {
    async fn handle(&self, job: &ActivatedJob) -> Result<Variables, JobFailure> {
        let correlation_key = VarUtil::get_string(&job.variables, "correlationKey")
            .unwrap_or_else(|| DEFAULT_CORRELATION_KEY.to_string());

        // An explicit `variables` object is forwarded as-is; otherwise the
        // entire input payload travels with the message.
        let variables = match job.variables.get("variables") {
            Some(serde_json::Value::Object(map)) => map.clone(),
            _ => job.variables.clone(),
        };

        tracing::info!(
            "Forwarding message '{}' with correlation key '{}'",
            self.outgoing_event,
            correlation_key
        );

        self.gateway
            .publish_message(&self.outgoing_event, &correlation_key, variables)
            .await
            .map_err(|e| {
                JobFailure::retryable(format!(
                    "failed to publish '{}' (correlation key '{}'): {}",
                    self.outgoing_event, correlation_key, e
                ))
            })?;

        Ok(Variables::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use worker_gateway::{ActivateJobsRequest, GatewayError};

    /// Records publish calls; optionally fails them.
    #[derive(Default)]
    struct RecordingGateway {
        published: Mutex<Vec<(String, String, Variables)>>,
        fail_publish: bool,
    }

    #[async_trait]
    impl GatewayClient for RecordingGateway {
        async fn activate_jobs(
            &self,
            _request: &ActivateJobsRequest,
        ) -> Result<Vec<ActivatedJob>, GatewayError> {
            Ok(Vec::new())
        }

        async fn complete_job(
            &self,
            _job_key: i64,
            _variables: Variables,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn fail_job(
            &self,
            _job_key: i64,
            _retries: i32,
            _error_message: &str,
        ) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn publish_message(
            &self,
            name: &str,
            correlation_key: &str,
            variables: Variables,
        ) -> Result<(), GatewayError> {
            if self.fail_publish {
                return Err(GatewayError::Http {
                    status: 503,
                    body: "gateway unavailable".to_string(),
                });
            }
            self.published.lock().push((
                name.to_string(),
                correlation_key.to_string(),
                variables,
            ));
            Ok(())
        }
    }

    fn job_with(variables: serde_json::Value) -> ActivatedJob {
        ActivatedJob {
            key: 9,
            job_type: "incoming_event".to_string(),
            retries: 3,
            variables: serde_json::from_value(variables).unwrap(),
            process_instance_key: None,
            element_id: None,
        }
    }

    #[tokio::test]
    async fn explicit_correlation_key_and_variables_propagated() {
        let gateway = Arc::new(RecordingGateway::default());
        let handler =
            MessageForwardHandler::new(gateway.clone(), "outgoing_event".to_string());

        let result = handler
            .handle(&job_with(json!({
                "correlationKey": "abc123",
                "variables": {"x": 1}
            })))
            .await
            .unwrap();
        assert!(result.is_empty());

        let published = gateway.published.lock();
        assert_eq!(published.len(), 1);
        let (name, key, variables) = &published[0];
        assert_eq!(name, "outgoing_event");
        assert_eq!(key, "abc123");
        assert_eq!(variables["x"], json!(1));
        assert_eq!(variables.len(), 1);
    }

    #[tokio::test]
    async fn defaults_applied_when_fields_absent() {
        let gateway = Arc::new(RecordingGateway::default());
        let handler =
            MessageForwardHandler::new(gateway.clone(), "outgoing_event".to_string());

        handler
            .handle(&job_with(json!({"foo": "bar"})))
            .await
            .unwrap();

        let published = gateway.published.lock();
        let (_, key, variables) = &published[0];
        assert_eq!(key, DEFAULT_CORRELATION_KEY);
        // The whole input payload is forwarded.
        assert_eq!(variables["foo"], json!("bar"));
    }

    #[tokio::test]
    async fn non_object_variables_field_falls_back_to_whole_payload() {
        let gateway = Arc::new(RecordingGateway::default());
        let handler =
            MessageForwardHandler::new(gateway.clone(), "outgoing_event".to_string());

        handler
            .handle(&job_with(json!({"variables": 42, "foo": "bar"})))
            .await
            .unwrap();

        let published = gateway.published.lock();
        let (_, _, variables) = &published[0];
        assert_eq!(variables["foo"], json!("bar"));
        assert_eq!(variables["variables"], json!(42));
    }

    #[tokio::test]
    async fn publish_failure_surfaces_as_retryable() {
        let gateway = Arc::new(RecordingGateway {
            fail_publish: true,
            ..Default::default()
        });
        let handler = MessageForwardHandler::new(gateway, "outgoing_event".to_string());

        let failure = handler
            .handle(&job_with(json!({"correlationKey": "k"})))
            .await
            .unwrap_err();
        assert!(failure.retryable);
        assert!(failure.message.contains("outgoing_event"));
    }
}
