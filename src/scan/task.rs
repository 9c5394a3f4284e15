//! One pillar's unit of work: prompt, oracle call, recovery parse, score

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::catalog::ControlCatalog;
use crate::error::TaskFailure;
use crate::models::{ControlSpec, PillarId, PillarScore, ScanSettings};
use crate::oracle::{build_assessment_prompt, complete_with_retry, OracleRequest, ReasoningOracle, RetryPolicy};
use crate::parser::ResponseRecoveryParser;
use crate::scoring::score_pillar;

#[derive(Debug, Clone)]
pub struct AssessmentTask {
    pub pillar: PillarId,
    pub controls: &'static [ControlSpec],
    pub context: Arc<Value>,
    /// Covers the oracle call and its retries
    pub deadline: Duration,
    pub max_output_tokens: u32,
    pub retry: RetryPolicy,
}

impl AssessmentTask {
    pub fn new(pillar: PillarId, context: Arc<Value>, settings: &ScanSettings) -> Self {
        Self {
            pillar,
            controls: ControlCatalog::controls(pillar),
            context,
            deadline: settings.task_timeout,
            max_output_tokens: settings.max_output_tokens,
            retry: RetryPolicy::new(settings.max_retries),
        }
    }

    pub fn request(&self) -> OracleRequest {
        OracleRequest {
            prompt: build_assessment_prompt(self.pillar, self.controls, &self.context),
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Evaluate the pillar.
    ///
    /// Finishes as `Cancelled` as soon as `cancel` fires, and as
    /// `OracleTimeout` once the deadline passes. Neither is retried.
    pub async fn evaluate(
        &self,
        oracle: &dyn ReasoningOracle,
        cancel: &CancellationToken,
    ) -> Result<PillarScore, TaskFailure> {
        let started = Instant::now();
        let request = self.request();

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TaskFailure::Cancelled),
            outcome = tokio::time::timeout(self.deadline, complete_with_retry(oracle, &request, self.retry)) => {
                match outcome {
                    Err(_) => return Err(TaskFailure::OracleTimeout(self.deadline)),
                    Ok(Err(e)) => return Err(TaskFailure::OracleUnavailable(e)),
                    Ok(Ok(raw)) => raw,
                }
            }
        };

        let mut results = ResponseRecoveryParser::parse(&raw)?;

        for result in &mut results {
            match ControlCatalog::find(self.pillar, &result.control_id) {
                Some(control) => {
                    if result.control_name.is_none() {
                        result.control_name = Some(control.control_name.to_string());
                    }
                }
                None => debug!(
                    pillar = %self.pillar,
                    control_id = %result.control_id,
                    "Oracle reported a control outside the catalog"
                ),
            }
        }

        let score = score_pillar(self.pillar, results);
        info!(
            pillar = %self.pillar,
            score = score.score,
            passed = score.passed_count,
            failed = score.failed_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pillar assessed"
        );

        Ok(score)
    }
}
