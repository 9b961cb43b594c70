// Response validation and the fallback policy. The provider payload is
// checked for shape and coerced into a fully-typed result before anything
// downstream trusts it; every failure on the lookup path degrades into the
// one conservative fallback value.

use serde::{Deserialize, Serialize};
use worker_common::{InvalidShape, VarUtil, Variables};

/// The validated (or fallback) outcome of a credit-score lookup. Always
/// fully specified; the handler never returns a partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditScoreResult {
    pub creditworthy: bool,
    pub score: i64,
}

impl CreditScoreResult {
    /// The safe default substituted for any upstream failure. Deliberately
    /// conservative: an unreachable provider means "not creditworthy", not
    /// a stalled process instance.
    pub fn fallback() -> Self {
        Self {
            creditworthy: false,
            score: 0,
        }
    }

    /// The result as a job variable mapping.
    pub fn into_variables(self) -> Variables {
        let mut variables = Variables::new();
        variables.insert("creditworthy".to_string(), self.creditworthy.into());
        variables.insert("score".to_string(), self.score.into());
        variables
    }
}

/// Check the provider payload: must be an object carrying a
/// boolean-coercible `creditworthy` and an integer-coercible `score`.
/// Coercion failure is a validation failure, never a silent default.
pub fn validate(payload: &serde_json::Value) -> Result<CreditScoreResult, InvalidShape> {
    let object = payload
        .as_object()
        .ok_or_else(|| InvalidShape::new("payload is not an object", payload))?;

    let creditworthy = object
        .get("creditworthy")
        .ok_or_else(|| InvalidShape::new("missing key 'creditworthy'", payload))?;
    let creditworthy = VarUtil::coerce_bool(creditworthy)
        .ok_or_else(|| InvalidShape::new("'creditworthy' is not boolean-coercible", payload))?;

    let score = object
        .get("score")
        .ok_or_else(|| InvalidShape::new("missing key 'score'", payload))?;
    let score = VarUtil::coerce_i64(score)
        .ok_or_else(|| InvalidShape::new("'score' is not integer-coercible", payload))?;

    Ok(CreditScoreResult {
        creditworthy,
        score,
    })
}
