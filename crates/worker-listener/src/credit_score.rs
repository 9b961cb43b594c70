// Credit-score lookup handler: fetch -> validate -> fallback. Every failure
// on this path is recovered locally into the typed fallback result, so the
// job always completes; "not creditworthy" is business data, not an error
// state.

use crate::fetch::CreditScoreFetcher;
use crate::validate::{self, CreditScoreResult};
use crate::worker::JobHandler;
use async_trait::async_trait;
use worker_common::{JobFailure, VarUtil, Variables};
use worker_gateway::ActivatedJob;

/// Variable carrying the customer identifier in the job payload.
const CUSTOMER_ID_VARIABLE: &str = "customer_id";

pub struct CreditScoreHandler {
    fetcher: CreditScoreFetcher,
}

impl CreditScoreHandler {
    pub fn new(fetcher: CreditScoreFetcher) -> Self {
        Self { fetcher }
    }

    /// Look up one customer, degrading any failure into the fallback.
    async fn check(&self, customer_id: &str) -> CreditScoreResult {
        tracing::info!("Checking credit score for customer '{}'", customer_id);

        let payload = match self.fetcher.fetch(customer_id).await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(
                    "Lookup failed for customer '{}' (kind={}): {} - using fallback",
                    customer_id,
                    error.kind(),
                    error
                );
                return CreditScoreResult::fallback();
            }
        };

        match validate::validate(&payload) {
            Ok(result) => {
                tracing::info!(
                    "Credit check for customer '{}': creditworthy={} score={}",
                    customer_id,
                    result.creditworthy,
                    result.score
                );
                result
            }
            Err(invalid) => {
                tracing::warn!(
                    "Invalid provider payload for customer '{}' ({}): {} - using fallback",
                    customer_id,
                    invalid.reason,
                    invalid.payload
                );
                CreditScoreResult::fallback()
            }
        }
    }
}

#[async_trait]
impl JobHandler for CreditScoreHandler {
    async fn handle(&self, job: &ActivatedJob) -> Result<Variables, JobFailure> {
        let customer_id = VarUtil::get_string(&job.variables, CUSTOMER_ID_VARIABLE)
            .ok_or_else(|| {
                JobFailure::terminal(format!(
                    "job {} is missing the '{}' variable",
                    job.key, CUSTOMER_ID_VARIABLE
                ))
            })?;

        Ok(self.check(&customer_id).await.into_variables())
    }
}
