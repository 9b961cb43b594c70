// JobWorker: the runtime shell. Registers one handler per job type, then
// runs an indefinite receive loop: activate jobs, dispatch each on its own
// task, and translate the handler outcome into the orchestrator's
// complete/fail reporting. One job's failure never blocks the loop.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker_common::{JobFailure, Variables};
use worker_gateway::{ActivateJobsRequest, ActivatedJob, GatewayClient};

/// How long an activated job stays locked to this worker.
const JOB_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-side long-poll duration per activation request.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause before re-polling while every concurrency slot is taken.
const SLOTS_FULL_DELAY: Duration = Duration::from_millis(100);

/// Poll-error backoff bounds.
const MIN_POLL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_POLL_BACKOFF: Duration = Duration::from_secs(60);

/// A per-job-type handler. Implementations must be safe to invoke
/// concurrently for different jobs.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Turn one job into a result mapping, or a classified failure.
    async fn handle(&self, job: &ActivatedJob) -> Result<Variables, JobFailure>;
}

/// Exponential backoff for receive-loop errors: doubles from 1s up to 60s,
/// reset on the first successful poll.
pub struct PollBackoff {
    current: Duration,
}

impl PollBackoff {
    pub fn new() -> Self {
        Self {
            current: MIN_POLL_BACKOFF,
        }
    }

    pub fn reset(&mut self) {
        self.current = MIN_POLL_BACKOFF;
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Sleep for the current delay, then double it (capped).
    ///
    /// Returns `false` if cancelled before the delay elapsed.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_POLL_BACKOFF);

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Subscribed,
}

struct Subscription {
    job_type: String,
    handler: Arc<dyn JobHandler>,
}

/// The worker runtime shell.
pub struct JobWorker {
    gateway: Arc<dyn GatewayClient>,
    worker_name: String,
    max_jobs: u32,
    subscriptions: Vec<Subscription>,
    in_flight: Arc<AtomicU32>,
    state: WorkerState,
}

impl JobWorker {
    pub fn new(gateway: Arc<dyn GatewayClient>, worker_name: String, max_jobs: u32) -> Self {
        Self {
            gateway,
            worker_name,
            max_jobs: max_jobs.max(1),
            subscriptions: Vec::new(),
            in_flight: Arc::new(AtomicU32::new(0)),
            state: WorkerState::Idle,
        }
    }

    /// Register exactly one handler for a job type. A duplicate registration
    /// is rejected.
    pub fn subscribe(
        &mut self,
        job_type: impl Into<String>,
        handler: Arc<dyn JobHandler>,
    ) -> Result<()> {
        let job_type = job_type.into();
        anyhow::ensure!(
            !self.subscriptions.iter().any(|s| s.job_type == job_type),
            "a handler is already subscribed for job type '{job_type}'"
        );
        self.subscriptions.push(Subscription { job_type, handler });
        Ok(())
    }

    /// Enter the receive loop. Blocks until `cancel` fires; the
    /// `Idle -> Subscribed` transition happens exactly once.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        anyhow::ensure!(
            !self.subscriptions.is_empty(),
            "cannot run a worker with no subscribed handlers"
        );
        anyhow::ensure!(
            self.state == WorkerState::Idle,
            "worker is already subscribed"
        );
        self.state = WorkerState::Subscribed;

        for subscription in &self.subscriptions {
            tracing::info!(
                "Subscribed handler for job type '{}'",
                subscription.job_type
            );
        }

        let mut backoff = PollBackoff::new();

        'receive: loop {
            for subscription in &self.subscriptions {
                if cancel.is_cancelled() {
                    break 'receive;
                }

                let capacity = self
                    .max_jobs
                    .saturating_sub(self.in_flight.load(Ordering::Acquire));
                if capacity == 0 {
                    tokio::select! {
                        _ = tokio::time::sleep(SLOTS_FULL_DELAY) => continue,
                        _ = cancel.cancelled() => break 'receive,
                    }
                }

                let request = ActivateJobsRequest {
                    job_type: subscription.job_type.clone(),
                    timeout: JOB_LOCK_TIMEOUT.as_millis() as u64,
                    max_jobs_to_activate: capacity,
                    request_timeout: LONG_POLL_TIMEOUT.as_millis() as u64,
                    worker: self.worker_name.clone(),
                };

                let result = tokio::select! {
                    result = self.gateway.activate_jobs(&request) => result,
                    _ = cancel.cancelled() => break 'receive,
                };

                match result {
                    Ok(jobs) => {
                        backoff.reset();
                        for job in jobs {
                            self.dispatch(job, subscription.handler.clone());
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to activate jobs for '{}': {}",
                            subscription.job_type,
                            e
                        );
                        if !backoff.wait(&cancel).await {
                            break 'receive;
                        }
                    }
                }
            }
        }

        tracing::info!("Receive loop stopped");
        Ok(())
    }

    /// Run one job on its own task and report the outcome. A panicking
    /// handler fails only its own job.
    fn dispatch(&self, job: ActivatedJob, handler: Arc<dyn JobHandler>) {
        let gateway = self.gateway.clone();
        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::AcqRel);

        tokio::spawn(async move {
            Self::execute(gateway, handler, job).await;
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });
    }

    async fn execute(
        gateway: Arc<dyn GatewayClient>,
        handler: Arc<dyn JobHandler>,
        job: ActivatedJob,
    ) {
        let job_key = job.key;
        let job_type = job.job_type.clone();
        let retries = job.retries;

        // Isolate the handler so a panic is contained to this job.
        let outcome = tokio::spawn(async move { handler.handle(&job).await }).await;

        match outcome {
            Ok(Ok(variables)) => {
                if let Err(e) = gateway.complete_job(job_key, variables).await {
                    tracing::error!("Failed to complete job {} ({}): {}", job_key, job_type, e);
                }
            }
            Ok(Err(failure)) => {
                let remaining = if failure.retryable {
                    (retries - 1).max(0)
                } else {
                    0
                };
                tracing::warn!(
                    "Job {} ({}) failed (retryable={}, retries_left={}): {}",
                    job_key,
                    job_type,
                    failure.retryable,
                    remaining,
                    failure.message
                );
                if let Err(e) = gateway.fail_job(job_key, remaining, &failure.message).await {
                    tracing::error!("Failed to report failure for job {}: {}", job_key, e);
                }
            }
            Err(join_error) => {
                tracing::error!("Handler for job {} panicked: {}", job_key, join_error);
                let message = format!("handler panicked: {join_error}");
                if let Err(e) = gateway.fail_job(job_key, 0, &message).await {
                    tracing::error!("Failed to report panic for job {}: {}", job_key, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use worker_gateway::GatewayError;

    #[test]
    fn poll_backoff_doubles_and_caps() {
        let mut backoff = PollBackoff::new();
        assert_eq!(backoff.current(), Duration::from_secs(1));

        // wait() is what advances the delay; simulate by direct doubling.
        backoff.current = (backoff.current * 2).min(MAX_POLL_BACKOFF);
        assert_eq!(backoff.current(), Duration::from_secs(2));

        for _ in 0..10 {
            backoff.current = (backoff.current * 2).min(MAX_POLL_BACKOFF);
        }
        assert_eq!(backoff.current(), MAX_POLL_BACKOFF);

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_secs(1));
    }

    // -- mock gateway -------------------------------------------------------

    #[derive(Default)]
    struct MockGateway {
        /// Batches returned by successive activate calls; empty afterwards.
        batches: Mutex<VecDeque<Vec<ActivatedJob>>>,
        completed: Mutex<Vec<(i64, Variables)>>,
        failed: Mutex<Vec<(i64, i32, String)>>,
    }

    #[async_trait]
    impl GatewayClient for MockGateway {
        async fn activate_jobs(
            &self,
            _request: &ActivateJobsRequest,
        ) -> Result<Vec<ActivatedJob>, GatewayError> {
            let batch = self.batches.lock().pop_front().unwrap_or_default();
            // Simulate a short long-poll so the loop does not spin hot.
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(batch)
        }

        async fn complete_job(
            &self,
            job_key: i64,
            variables: Variables,
        ) -> Result<(), GatewayError> {
            self.completed.lock().push((job_key, variables));
            Ok(())
        }

        async fn fail_job(
            &self,
            job_key: i64,
            retries: i32,
            error_message: &str,
        ) -> Result<(), GatewayError> {
            self.failed
                .lock()
                .push((job_key, retries, error_message.to_string()));
            Ok(())
        }

        async fn publish_message(
            &self,
            _name: &str,
            _correlation_key: &str,
            _variables: Variables,
        ) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn job(key: i64, job_type: &str, variables: serde_json::Value) -> ActivatedJob {
        ActivatedJob {
            key,
            job_type: job_type.to_string(),
            retries: 3,
            variables: serde_json::from_value(variables).unwrap(),
            process_instance_key: None,
            element_id: None,
        }
    }

    struct EchoHandler;

    #[async_trait]
    impl JobHandler for EchoHandler {
        async fn handle(&self, job: &ActivatedJob) -> Result<Variables, JobFailure> {
            Ok(job.variables.clone())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl JobHandler for FailingHandler {
        async fn handle(&self, _job: &ActivatedJob) -> Result<Variables, JobFailure> {
            Err(JobFailure::retryable("downstream unavailable"))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl JobHandler for PanickingHandler {
        async fn handle(&self, job: &ActivatedJob) -> Result<Variables, JobFailure> {
            if job.key == 1 {
                panic!("boom");
            }
            Ok(Variables::new())
        }
    }

    async fn run_until_idle(worker: &mut JobWorker) {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            stop.cancel();
        });
        worker.run(cancel).await.unwrap();
        // Let dispatched tasks finish reporting.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn completes_successful_jobs() {
        let gateway = Arc::new(MockGateway::default());
        gateway
            .batches
            .lock()
            .push_back(vec![job(1, "check_credit_score", json!({"a": 1}))]);

        let mut worker = JobWorker::new(gateway.clone(), "test".to_string(), 4);
        worker
            .subscribe("check_credit_score", Arc::new(EchoHandler))
            .unwrap();
        run_until_idle(&mut worker).await;

        let completed = gateway.completed.lock();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].0, 1);
        assert_eq!(completed[0].1["a"], json!(1));
    }

    #[tokio::test]
    async fn reports_retryable_failure_with_decremented_retries() {
        let gateway = Arc::new(MockGateway::default());
        gateway
            .batches
            .lock()
            .push_back(vec![job(5, "incoming_event", json!({}))]);

        let mut worker = JobWorker::new(gateway.clone(), "test".to_string(), 4);
        worker
            .subscribe("incoming_event", Arc::new(FailingHandler))
            .unwrap();
        run_until_idle(&mut worker).await;

        let failed = gateway.failed.lock();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, 5);
        assert_eq!(failed[0].1, 2); // 3 retries on the job, one consumed
        assert!(failed[0].2.contains("downstream unavailable"));
    }

    #[tokio::test]
    async fn panicking_handler_does_not_stop_the_loop() {
        let gateway = Arc::new(MockGateway::default());
        {
            let mut batches = gateway.batches.lock();
            batches.push_back(vec![job(1, "t", json!({}))]); // panics
            batches.push_back(vec![job(2, "t", json!({}))]); // completes
        }

        let mut worker = JobWorker::new(gateway.clone(), "test".to_string(), 4);
        worker.subscribe("t", Arc::new(PanickingHandler)).unwrap();
        run_until_idle(&mut worker).await;

        assert_eq!(gateway.completed.lock().len(), 1);
        let failed = gateway.failed.lock();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1, 0);
        assert!(failed[0].2.contains("panicked"));
    }

    #[tokio::test]
    async fn duplicate_subscription_rejected() {
        let gateway = Arc::new(MockGateway::default());
        let mut worker = JobWorker::new(gateway, "test".to_string(), 4);
        worker.subscribe("t", Arc::new(EchoHandler)).unwrap();
        assert!(worker.subscribe("t", Arc::new(EchoHandler)).is_err());
    }

    #[tokio::test]
    async fn running_without_subscriptions_is_an_error() {
        let gateway = Arc::new(MockGateway::default());
        let mut worker = JobWorker::new(gateway, "test".to_string(), 4);
        assert!(worker.run(CancellationToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_jobs_complete_independently() {
        let gateway = Arc::new(MockGateway::default());
        gateway.batches.lock().push_back(vec![
            job(10, "t", json!({"customer": "a"})),
            job(11, "t", json!({"customer": "b"})),
            job(12, "t", json!({"customer": "c"})),
        ]);

        let mut worker = JobWorker::new(gateway.clone(), "test".to_string(), 8);
        worker.subscribe("t", Arc::new(EchoHandler)).unwrap();
        run_until_idle(&mut worker).await;

        let completed = gateway.completed.lock();
        assert_eq!(completed.len(), 3);
        for (key, variables) in completed.iter() {
            let expected = match key {
                10 => "a",
                11 => "b",
                12 => "c",
                other => panic!("unexpected job key {other}"),
            };
            assert_eq!(variables["customer"], json!(expected));
        }
    }
}
