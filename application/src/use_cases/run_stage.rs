//! Stage runner
//!
//! Invokes one stage under its deadline and classifies what came back.

use crate::config::BatchParams;
use crate::ports::stage::{Stage, StageContext};
use loanflow_domain::{
    LoanError, OutcomeKind, StageResult, StageSpec, StageVerdict, truncate_detail,
};
use std::time::Instant;
use tracing::{debug, warn};

/// Runs a single stage for a single loan.
///
/// Classification order: deadline exceeded is `timeout`; a stage error is
/// `failure`; otherwise the stage's own verdict decides.
#[derive(Debug, Clone)]
pub struct StageRunner {
    detail_limit: usize,
    output_limit: usize,
}

impl Default for StageRunner {
    fn default() -> Self {
        Self::from_params(&BatchParams::default())
    }
}

impl StageRunner {
    pub fn new(detail_limit: usize, output_limit: usize) -> Self {
        Self {
            detail_limit,
            output_limit,
        }
    }

    pub fn from_params(params: &BatchParams) -> Self {
        Self::new(params.detail_limit, params.output_limit)
    }

    pub async fn run(&self, spec: &StageSpec, stage: &dyn Stage, ctx: &StageContext) -> StageResult {
        debug!("Stage {} starting for loan {}", spec.name, ctx.loan_id);
        let started = Instant::now();

        let outcome = tokio::time::timeout(spec.timeout, stage.execute(ctx)).await;
        let elapsed = started.elapsed();

        let result = match outcome {
            Err(_) => {
                let error = LoanError::Timeout {
                    stage: spec.name.clone(),
                    after: spec.timeout,
                };
                warn!("Loan {}: {}", ctx.loan_id, error);
                StageResult::new(&spec.name, ctx.loan_id.clone(), OutcomeKind::Timeout, "", elapsed)
                    .with_error(error.to_string())
            }
            Ok(Err(e)) => {
                warn!("Loan {}: stage {} raised: {}", ctx.loan_id, spec.name, e);
                StageResult::new(&spec.name, ctx.loan_id.clone(), OutcomeKind::Failure, "", elapsed)
                    .with_error(truncate_detail(&e.to_string(), self.detail_limit))
            }
            Ok(Ok(report)) => {
                let output = truncate_detail(&report.transcript, self.output_limit);
                let result = StageResult::new(
                    &spec.name,
                    ctx.loan_id.clone(),
                    report.verdict.kind(),
                    output,
                    elapsed,
                );
                match &report.verdict {
                    StageVerdict::Success => result,
                    StageVerdict::NoData(reason) | StageVerdict::Failure(reason) => {
                        result.with_error(truncate_detail(reason, self.detail_limit))
                    }
                }
            }
        };

        debug!(
            "Stage {} for loan {} finished as {} in {:.1}s",
            spec.name,
            ctx.loan_id,
            result.outcome,
            elapsed.as_secs_f64()
        );
        result.with_attempt(ctx.attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::stage::StageError;
    use async_trait::async_trait;
    use loanflow_domain::StageReport;
    use std::time::Duration;

    struct FixedStage {
        delay: Duration,
        report: fn() -> Result<StageReport, StageError>,
    }

    #[async_trait]
    impl Stage for FixedStage {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn execute(&self, _ctx: &StageContext) -> Result<StageReport, StageError> {
            tokio::time::sleep(self.delay).await;
            (self.report)()
        }
    }

    fn spec(timeout_ms: u64) -> StageSpec {
        StageSpec::new("fixed", Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn test_success() {
        let stage = FixedStage {
            delay: Duration::ZERO,
            report: || Ok(StageReport::success("done")),
        };
        let result = StageRunner::default()
            .run(&spec(1000), &stage, &StageContext::new("L1"))
            .await;
        assert_eq!(result.outcome, OutcomeKind::Success);
        assert_eq!(result.output, "done");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_is_timeout() {
        let stage = FixedStage {
            delay: Duration::from_millis(500),
            report: || Ok(StageReport::success("late")),
        };
        let result = StageRunner::default()
            .run(&spec(50), &stage, &StageContext::new("L1"))
            .await;
        assert_eq!(result.outcome, OutcomeKind::Timeout);
        assert!(result.duration < Duration::from_millis(500));
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_stage_error_is_truncated_failure() {
        let stage = FixedStage {
            delay: Duration::ZERO,
            report: || Err(StageError::Other("é".repeat(400))),
        };
        let result = StageRunner::new(200, 4000)
            .run(&spec(1000), &stage, &StageContext::new("L1"))
            .await;
        assert_eq!(result.outcome, OutcomeKind::Failure);
        assert_eq!(result.error.unwrap().chars().count(), 200);
    }

    #[tokio::test]
    async fn test_no_data_verdict() {
        let stage = FixedStage {
            delay: Duration::ZERO,
            report: || Ok(StageReport::no_data("No paystub or W2 documents found")),
        };
        let result = StageRunner::default()
            .run(&spec(1000), &stage, &StageContext::new("L1").with_attempt(2))
            .await;
        assert_eq!(result.outcome, OutcomeKind::NoData);
        assert_eq!(result.attempt, 2);
        assert_eq!(
            result.error.as_deref(),
            Some("No paystub or W2 documents found")
        );
    }

    #[tokio::test]
    async fn test_output_is_bounded() {
        let stage = FixedStage {
            delay: Duration::ZERO,
            report: || Ok(StageReport::success("x".repeat(10_000))),
        };
        let result = StageRunner::new(200, 100)
            .run(&spec(1000), &stage, &StageContext::new("L1"))
            .await;
        assert_eq!(result.output.chars().count(), 100);
    }
}
