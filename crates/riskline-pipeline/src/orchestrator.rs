//! Sequential job orchestration.
//!
//! `AnalysisOrchestrator::run` drives one job end to end: mark it
//! processing, preflight the model, process each operation in order,
//! persist results as they land, then complete the job. Operations that
//! exhaust their retries are recorded in the job's error summary; only
//! an unreachable model before the first operation fails the whole job.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use riskline_core::{
    emit_job_completed, emit_job_failed, emit_job_started, emit_operation_completed,
    emit_operation_started, AnalysisId, EventStatus, JobSpan, PfmeaResult, ProgressEvent,
    StageName, METRICS,
};
use riskline_llm::ModelClient;
use riskline_state::AnalysisStore;
use serde_json::json;

use crate::error::PipelineError;
use crate::processor::{OperationProcessor, RetryPolicy};
use crate::sink::{publish_or_warn, EventSink};

/// Cooperative cancellation flag, checked between operations.
///
/// Cancellation never interrupts an operation mid-stage; the current
/// operation finishes and its results are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One operation that produced no results after its retries ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub index: usize,
    pub process: String,
    pub error: String,
}

/// Outcome of one orchestrated run.
#[derive(Debug)]
pub struct AnalysisReport {
    pub analysis_id: AnalysisId,
    /// All finalized records, in operation then candidate order.
    pub results: Vec<PfmeaResult>,
    /// Operations that yielded nothing.
    pub failures: Vec<OperationFailure>,
    /// Index of the first skipped operation when cancelled mid-run.
    pub cancelled_at: Option<usize>,
    pub duration_ms: u64,
}

/// Drives analysis jobs one operation at a time.
pub struct AnalysisOrchestrator {
    store: Arc<dyn AnalysisStore>,
    client: Arc<dyn ModelClient>,
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        client: Arc<dyn ModelClient>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            client,
            sink,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the default retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one job to a terminal status.
    ///
    /// The job must exist and be pending. Returns the report on any
    /// completed run, including runs where operations failed or the job
    /// was cancelled; `Err` means the job itself could not run.
    pub async fn run(
        &self,
        analysis_id: &AnalysisId,
        cancel: &CancelHandle,
    ) -> Result<AnalysisReport, PipelineError> {
        let started = Instant::now();
        let _span = JobSpan::enter(&analysis_id.0);

        let record = self.store.get_job(analysis_id).await?;
        let operations = record.job.operations;
        let total = operations.len();

        self.store.mark_processing(analysis_id).await?;
        emit_job_started(&analysis_id.0, total);
        self.publish(
            analysis_id,
            StageName::Job,
            EventStatus::Started,
            format!("Starting analysis of {total} operation(s)"),
            json!({"operation_count": total}),
        );

        // An empty job completes without touching the model.
        if operations.is_empty() {
            self.store.complete_job(analysis_id, None).await?;
            METRICS.inc_jobs_completed();
            let duration_ms = started.elapsed().as_millis() as u64;
            emit_job_completed(&analysis_id.0, duration_ms, 0, 0);
            self.publish(
                analysis_id,
                StageName::Job,
                EventStatus::Completed,
                "Analysis completed: 0 result(s), 0 failed operation(s)",
                json!({"result_count": 0, "failed_operations": 0, "duration_ms": duration_ms}),
            );
            return Ok(AnalysisReport {
                analysis_id: analysis_id.clone(),
                results: Vec::new(),
                failures: Vec::new(),
                cancelled_at: None,
                duration_ms,
            });
        }

        if !self.client.check_connection().await {
            let reason = "model service unreachable";
            self.store.fail_job(analysis_id, reason).await?;
            emit_job_failed(&analysis_id.0, &reason);
            self.publish(
                analysis_id,
                StageName::Job,
                EventStatus::Error,
                format!("Analysis failed: {reason}"),
                json!({"error": reason}),
            );
            return Err(PipelineError::OrchestrationFatal {
                reason: reason.to_string(),
            });
        }

        let processor =
            OperationProcessor::new(self.client.clone(), self.sink.clone(), self.policy.clone());

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut cancelled_at = None;

        for (index, operation) in operations.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled_at = Some(index);
                break;
            }

            emit_operation_started(&analysis_id.0, index, &operation.process);
            self.publish(
                analysis_id,
                StageName::Operation,
                EventStatus::Started,
                format!(
                    "Processing operation {} of {}: {}",
                    index + 1,
                    total,
                    operation.process
                ),
                json!({"operation_index": index, "process": operation.process}),
            );

            let outcome = processor.process(analysis_id, index, operation).await;
            METRICS.inc_operations_processed();

            if let Some(error) = outcome.error {
                // The processor already published the operation error event.
                failures.push(OperationFailure {
                    index,
                    process: operation.process.clone(),
                    error: error.to_string(),
                });
                continue;
            }

            for result in &outcome.results {
                self.store.append_result(analysis_id, result.clone()).await?;
            }
            emit_operation_completed(&analysis_id.0, index, outcome.results.len());
            self.publish(
                analysis_id,
                StageName::Operation,
                EventStatus::Completed,
                format!(
                    "Operation '{}' produced {} result(s)",
                    operation.process,
                    outcome.results.len()
                ),
                json!({"operation_index": index, "result_count": outcome.results.len()}),
            );
            results.extend(outcome.results);
        }

        let error_summary = build_error_summary(&failures, cancelled_at, total);
        self.store.complete_job(analysis_id, error_summary).await?;
        METRICS.inc_jobs_completed();

        let duration_ms = started.elapsed().as_millis() as u64;
        emit_job_completed(&analysis_id.0, duration_ms, results.len(), failures.len());
        self.publish(
            analysis_id,
            StageName::Job,
            EventStatus::Completed,
            format!(
                "Analysis completed: {} result(s), {} failed operation(s)",
                results.len(),
                failures.len()
            ),
            json!({
                "result_count": results.len(),
                "failed_operations": failures.len(),
                "duration_ms": duration_ms,
            }),
        );

        Ok(AnalysisReport {
            analysis_id: analysis_id.clone(),
            results,
            failures,
            cancelled_at,
            duration_ms,
        })
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

fn build_error_summary(
    failures: &[OperationFailure],
    cancelled_at: Option<usize>,
    total: usize,
) -> Option<String> {
    let mut parts = Vec::new();
    if !failures.is_empty() {
        let details = failures
            .iter()
            .map(|failure| {
                format!(
                    "operation {} ({}): {}",
                    failure.index, failure.process, failure.error
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        parts.push(format!(
            "{} of {} operations produced no results: {}",
            failures.len(),
            total,
            details
        ));
    }
    if let Some(index) = cancelled_at {
        parts.push(format!("cancelled after {index} of {total} operations"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, process: &str) -> OperationFailure {
        OperationFailure {
            index,
            process: process.to_string(),
            error: "rate failed after timeout".to_string(),
        }
    }

    #[test]
    fn test_cancel_handle_is_sticky() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_summary_empty_when_nothing_failed() {
        assert_eq!(build_error_summary(&[], None, 4), None);
    }

    #[test]
    fn test_summary_lists_failed_operations() {
        let summary = build_error_summary(&[failure(1, "Welding")], None, 3).unwrap();
        assert!(summary.starts_with("1 of 3 operations produced no results"));
        assert!(summary.contains("operation 1 (Welding): rate failed after timeout"));
    }

    #[test]
    fn test_summary_records_cancellation() {
        let summary = build_error_summary(&[], Some(2), 5).unwrap();
        assert_eq!(summary, "cancelled after 2 of 5 operations");
    }

    #[test]
    fn test_summary_joins_failures_and_cancellation() {
        let summary = build_error_summary(&[failure(0, "Casting")], Some(1), 5).unwrap();
        assert!(summary.contains("1 of 5 operations produced no results"));
        assert!(summary.contains(". cancelled after 1 of 5 operations"));
    }
}
