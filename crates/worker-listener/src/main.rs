// Entry point for the worker process.
//
// Loads and validates configuration (fatal on error, before any
// subscription is made), wires the gateway client and the selected handler
// together, and hands control to the runtime shell until a process signal
// stops it.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use worker_common::constants::{self, return_code};
use worker_common::{HttpClientFactory, SecretMasker, WorkerSettings};
use worker_gateway::{CredentialProvider, GatewayClient, RestGatewayClient};

use worker_listener::command_settings::{CommandSettings, WorkerRole};
use worker_listener::credit_score::CreditScoreHandler;
use worker_listener::fetch::CreditScoreFetcher;
use worker_listener::forwarder::MessageForwardHandler;
use worker_listener::worker::JobWorker;

/// Default timeout for short gateway calls (complete/fail/publish).
const GATEWAY_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn main() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime");

    let exit_code = runtime.block_on(run());
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    worker_common::logging::init();

    let settings = CommandSettings::parse();

    tracing::info!(
        "{} v{} starting (role: {:?})",
        constants::PACKAGE_NAME,
        constants::VERSION,
        settings.role()
    );

    // Configuration errors are fatal: the process must not enter the
    // receive loop on a partial setup.
    let config = match WorkerSettings::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            tracing::error!("Check the worker environment variables and restart");
            return return_code::CONFIGURATION_ERROR;
        }
    };
    config.log_startup();

    match run_worker(settings.role(), config).await {
        Ok(()) => {
            tracing::info!("Worker stopped");
            return_code::SUCCESS
        }
        Err(e) => {
            tracing::error!("Worker failed: {:?}", e);
            return_code::TERMINATED_ERROR
        }
    }
}

async fn run_worker(role: WorkerRole, config: WorkerSettings) -> Result<()> {
    let masker = SecretMasker::new();
    for secret in config.secret_values() {
        masker.add(secret);
    }

    let gateway_http = HttpClientFactory::create_gateway_client(GATEWAY_REQUEST_TIMEOUT)?;
    let credentials = CredentialProvider::new(config.auth.clone());
    let gateway: Arc<dyn GatewayClient> = Arc::new(RestGatewayClient::new(
        gateway_http,
        config.gateway_url.clone(),
        credentials,
        masker,
    ));

    // Unique instance name so the orchestrator can tell replicas apart.
    let instance_name = format!("{}-{}", config.worker_name, Uuid::new_v4().simple());
    let mut worker = JobWorker::new(gateway.clone(), instance_name, config.max_jobs);

    match role {
        WorkerRole::CreditScore => {
            let provider_client = HttpClientFactory::create_provider_client()?;
            let fetcher = CreditScoreFetcher::new(
                provider_client,
                config.provider_base_url.clone(),
                config.retry_policy.clone(),
            );
            worker.subscribe(
                config.credit_score_job_type.clone(),
                Arc::new(CreditScoreHandler::new(fetcher)),
            )?;
        }
        WorkerRole::ForwardMessages => {
            worker.subscribe(
                config.incoming_event.clone(),
                Arc::new(MessageForwardHandler::new(
                    gateway.clone(),
                    config.outgoing_event.clone(),
                )),
            )?;
        }
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        signal_cancel.cancel();
    })
    .context("Failed to install signal handler")?;

    tracing::info!("Entering receive loop (Ctrl+C to stop)");
    worker.run(cancel).await
}
