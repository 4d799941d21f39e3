//! Per-operation stage loop with retry.
//!
//! One `OperationProcessor::process` call runs ANALYZE → RATE → VALIDATE
//! → CORRECT → FINALIZE for a single operation. Transient model failures
//! restart the whole operation from ANALYZE with exponential backoff;
//! out-of-scale ratings drop the offending candidate and keep going.
//! Retry exhaustion yields an empty outcome, never a job-level error.

use std::sync::Arc;
use std::time::Duration;

use riskline_core::{
    emit_operation_exhausted, emit_retry_scheduled, emit_stage_failed, AnalysisId, EventStatus,
    Operation, PfmeaResult, ProgressEvent, StageName, METRICS,
};
use riskline_llm::ModelClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::StageError;
use crate::sink::{publish_or_warn, EventSink};
use crate::stages::{FinalizeInput, StageExecutor};

/// Retry budget and backoff shape for transient stage failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so `max_retries + 1` attempts total.
    pub max_retries: u32,
    /// Base backoff delay; failed attempt n waits base × 2^(n-1).
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Total attempts allowed per operation.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff before re-running after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms * 2u64.pow(attempt.saturating_sub(1)))
    }
}

/// What to do after one attempt at an operation.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Attempt produced results (possibly zero); the operation is done.
    Success(Vec<PfmeaResult>),
    /// Transient failure with retry budget left.
    Retrying { attempt: u32, delay: Duration },
    /// No budget left, or the failure is not retriable.
    Exhausted { attempts: u32, error: StageError },
}

/// Classify one attempt's result against the retry policy.
pub fn classify_attempt(
    policy: &RetryPolicy,
    attempt: u32,
    result: Result<Vec<PfmeaResult>, StageError>,
) -> AttemptOutcome {
    match result {
        Ok(results) => AttemptOutcome::Success(results),
        Err(error) if error.is_transient() && attempt < policy.max_attempts() => {
            AttemptOutcome::Retrying {
                attempt,
                delay: policy.delay_for(attempt),
            }
        }
        Err(error) => AttemptOutcome::Exhausted {
            attempts: attempt,
            error,
        },
    }
}

/// Result of processing one operation.
#[derive(Debug)]
pub struct OperationOutcome {
    /// Finalized records, in candidate order.
    pub results: Vec<PfmeaResult>,
    /// Set when the operation gave up after exhausting retries.
    pub error: Option<StageError>,
}

impl OperationOutcome {
    fn ok(results: Vec<PfmeaResult>) -> Self {
        Self {
            results,
            error: None,
        }
    }

    fn failed(error: StageError) -> Self {
        Self {
            results: Vec::new(),
            error: Some(error),
        }
    }
}

/// Runs the full stage sequence for one operation at a time.
pub struct OperationProcessor {
    executor: StageExecutor,
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
}

impl OperationProcessor {
    pub fn new(client: Arc<dyn ModelClient>, sink: Arc<dyn EventSink>, policy: RetryPolicy) -> Self {
        Self {
            executor: StageExecutor::new(client),
            sink,
            policy,
        }
    }

    /// Process one operation to completion, retrying transient failures.
    #[instrument(
        skip(self, analysis_id, operation),
        fields(analysis_id = %analysis_id, process = %operation.process)
    )]
    pub async fn process(
        &self,
        analysis_id: &AnalysisId,
        index: usize,
        operation: &Operation,
    ) -> OperationOutcome {
        let mut attempt = 1u32;
        loop {
            let result = self.attempt(analysis_id, index, operation).await;
            match classify_attempt(&self.policy, attempt, result) {
                AttemptOutcome::Success(results) => return OperationOutcome::ok(results),
                AttemptOutcome::Retrying { attempt: failed, delay } => {
                    METRICS.inc_retries_scheduled();
                    let delay_ms = delay.as_millis() as u64;
                    emit_retry_scheduled(&analysis_id.0, index, failed, delay_ms);
                    self.publish(
                        analysis_id,
                        StageName::Operation,
                        EventStatus::Retry,
                        format!(
                            "Retrying operation '{}' in {} ms (attempt {} of {} failed)",
                            operation.process,
                            delay_ms,
                            failed,
                            self.policy.max_attempts()
                        ),
                        json!({
                            "operation_index": index,
                            "attempt": failed,
                            "delay_ms": delay_ms,
                        }),
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                AttemptOutcome::Exhausted { attempts, error } => {
                    emit_operation_exhausted(&analysis_id.0, index, attempts, &error);
                    self.publish(
                        analysis_id,
                        StageName::Operation,
                        EventStatus::Error,
                        format!(
                            "Operation '{}' failed after {} attempt(s): {}",
                            operation.process, attempts, error
                        ),
                        json!({
                            "operation_index": index,
                            "attempts": attempts,
                            "error": error.to_string(),
                        }),
                    );
                    return OperationOutcome::failed(error);
                }
            }
        }
    }

    /// One pass through the five stages. Err means a transient failure
    /// that aborts the whole pass; candidate-level problems are handled
    /// inline.
    async fn attempt(
        &self,
        analysis_id: &AnalysisId,
        index: usize,
        operation: &Operation,
    ) -> Result<Vec<PfmeaResult>, StageError> {
        self.publish(
            analysis_id,
            StageName::Analyze,
            EventStatus::Started,
            format!("Analyzing process step: {}", operation.process),
            json!({"operation_index": index}),
        );
        let analysis = match self.executor.analyze(operation).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.stage_error(analysis_id, index, &error);
                return Err(error);
            }
        };
        self.publish(
            analysis_id,
            StageName::Analyze,
            EventStatus::Completed,
            format!(
                "Identified {} potential failure mode(s)",
                analysis.candidates.len()
            ),
            json!({
                "operation_index": index,
                "failure_modes_count": analysis.candidates.len(),
                "reasoning": analysis.reasoning,
            }),
        );

        let mut results = Vec::with_capacity(analysis.candidates.len());
        for candidate in &analysis.candidates {
            self.publish(
                analysis_id,
                StageName::Rate,
                EventStatus::Started,
                format!(
                    "Rating failure mode: {}",
                    preview(&candidate.failure_mode, 100)
                ),
                json!({"operation_index": index}),
            );
            let rating = match self.executor.rate(candidate, operation).await {
                Ok(rating) => rating,
                Err(error) => {
                    self.stage_error(analysis_id, index, &error);
                    if error.is_transient() {
                        return Err(error);
                    }
                    // Out-of-scale rating: drop this candidate, keep the rest.
                    continue;
                }
            };
            self.publish(
                analysis_id,
                StageName::Rate,
                EventStatus::Completed,
                format!(
                    "Assigned ratings: S={}, O={}",
                    rating.severity, rating.occurrence
                ),
                json!({
                    "operation_index": index,
                    "severity": rating.severity.value(),
                    "occurrence": rating.occurrence.value(),
                }),
            );

            self.publish(
                analysis_id,
                StageName::Validate,
                EventStatus::Started,
                "Validating assigned ratings...",
                json!({"operation_index": index}),
            );
            let verdict = match self.executor.validate(candidate, &rating).await {
                Ok(verdict) => verdict,
                Err(error) => {
                    self.stage_error(analysis_id, index, &error);
                    return Err(error);
                }
            };
            let validate_message = if verdict.is_valid {
                "Validation completed".to_string()
            } else if verdict.issues.is_empty() {
                "Validation found issues: Ratings need adjustment".to_string()
            } else {
                format!("Validation found issues: {}", verdict.issues.join(", "))
            };
            self.publish(
                analysis_id,
                StageName::Validate,
                EventStatus::Completed,
                validate_message,
                json!({
                    "operation_index": index,
                    "is_valid": verdict.is_valid,
                    "issues": verdict.issues,
                    "reasoning": verdict.reasoning,
                }),
            );

            let mut corrections = 0u32;
            let mut correction_reasoning = None;
            let mut final_rating = rating;
            if !verdict.is_valid {
                self.publish(
                    analysis_id,
                    StageName::Correct,
                    EventStatus::Started,
                    "Correcting ratings based on validation feedback...",
                    json!({"operation_index": index}),
                );
                let corrected = match self
                    .executor
                    .correct(candidate, &final_rating, &verdict)
                    .await
                {
                    Ok(corrected) => corrected,
                    Err(error) => {
                        self.stage_error(analysis_id, index, &error);
                        if error.is_transient() {
                            return Err(error);
                        }
                        continue;
                    }
                };
                corrections = 1;
                correction_reasoning = corrected
                    .reasoning
                    .clone()
                    .or_else(|| verdict.correction_reasoning.clone());
                self.publish(
                    analysis_id,
                    StageName::Correct,
                    EventStatus::Completed,
                    format!(
                        "Corrected ratings: S={}, O={}",
                        corrected.severity, corrected.occurrence
                    ),
                    json!({
                        "operation_index": index,
                        "severity": corrected.severity.value(),
                        "occurrence": corrected.occurrence.value(),
                    }),
                );
                final_rating = corrected;
            }

            self.publish(
                analysis_id,
                StageName::Finalize,
                EventStatus::Started,
                "Finalizing PFMEA result...",
                json!({"operation_index": index}),
            );
            let result = self.executor.finalize(FinalizeInput {
                analysis_id,
                operation_index: index,
                operation,
                candidate,
                rating: &final_rating,
                analysis_reasoning: analysis.reasoning.clone(),
                validation_reasoning: verdict.reasoning.clone(),
                correction_reasoning,
                corrections,
            });
            self.publish(
                analysis_id,
                StageName::Finalize,
                EventStatus::Completed,
                format!(
                    "PFMEA result finalized: RPN={}, Risk={}",
                    result.rpn, result.risk_level
                ),
                serde_json::to_value(&result).unwrap_or_default(),
            );
            results.push(result);
        }

        Ok(results)
    }

    fn stage_error(&self, analysis_id: &AnalysisId, index: usize, error: &StageError) {
        emit_stage_failed(&analysis_id.0, index, error.stage().as_str(), error);
        self.publish(
            analysis_id,
            error.stage(),
            EventStatus::Error,
            error.to_string(),
            json!({"operation_index": index}),
        );
    }

    fn publish(
        &self,
        analysis_id: &AnalysisId,
        stage: StageName,
        status: EventStatus,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) {
        publish_or_warn(
            self.sink.as_ref(),
            ProgressEvent::new(analysis_id.clone(), stage, status, message, detail),
        );
    }
}

/// Truncate long model text for event messages.
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
