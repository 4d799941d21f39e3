//! Structured observability hooks for analysis lifecycle events.
//!
//! This module provides:
//! - Job-scoped tracing spans via the `JobSpan` RAII guard
//! - Emission functions for the key lifecycle points: job start/finish,
//!   per-operation progress, stage failures, retries, sink trouble
//!
//! Events are emitted at `info!` level (filter via `RUST_LOG`); failure
//! paths use `warn!`.

use tracing::{info, warn};

/// RAII guard that enters a job-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = JobSpan::enter("6d1f...");
/// // All tracing calls below carry analysis_id automatically.
/// ```
pub struct JobSpan {
    _span: tracing::span::EnteredSpan,
}

impl JobSpan {
    /// Create and enter a span tagged with the analysis id.
    pub fn enter(analysis_id: &str) -> Self {
        let span = tracing::info_span!("riskline.job", analysis_id = %analysis_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: job started with its operation count.
pub fn emit_job_started(analysis_id: &str, operation_count: usize) {
    info!(
        event = "job.started",
        analysis_id = %analysis_id,
        operation_count = operation_count,
    );
}

/// Emit event: job completed with duration and result/failure counts.
pub fn emit_job_completed(
    analysis_id: &str,
    duration_ms: u64,
    result_count: usize,
    failed_operations: usize,
) {
    info!(
        event = "job.completed",
        analysis_id = %analysis_id,
        duration_ms = duration_ms,
        result_count = result_count,
        failed_operations = failed_operations,
    );
}

/// Emit event: job failed before any operation was attempted.
pub fn emit_job_failed(analysis_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "job.failed", analysis_id = %analysis_id, error = %error);
}

/// Emit event: operation processing started.
pub fn emit_operation_started(analysis_id: &str, index: usize, process: &str) {
    info!(
        event = "operation.started",
        analysis_id = %analysis_id,
        index = index,
        process = %process,
    );
}

/// Emit event: operation finished with its result count.
pub fn emit_operation_completed(analysis_id: &str, index: usize, result_count: usize) {
    info!(
        event = "operation.completed",
        analysis_id = %analysis_id,
        index = index,
        result_count = result_count,
    );
}

/// Emit event: operation gave up after exhausting its retry budget.
pub fn emit_operation_exhausted(
    analysis_id: &str,
    index: usize,
    attempts: u32,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "operation.exhausted",
        analysis_id = %analysis_id,
        index = index,
        attempts = attempts,
        error = %error,
    );
}

/// Emit event: a pipeline stage failed (warning level).
pub fn emit_stage_failed(
    analysis_id: &str,
    index: usize,
    stage: &str,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "stage.failed",
        analysis_id = %analysis_id,
        index = index,
        stage = %stage,
        error = %error,
    );
}

/// Emit event: a retry of the whole operation was scheduled.
pub fn emit_retry_scheduled(analysis_id: &str, index: usize, attempt: u32, delay_ms: u64) {
    info!(
        event = "retry.scheduled",
        analysis_id = %analysis_id,
        index = index,
        attempt = attempt,
        delay_ms = delay_ms,
    );
}

/// Emit event: progress delivery failed; the pipeline keeps going.
pub fn emit_sink_error(analysis_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "sink.publish_failed", analysis_id = %analysis_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_span_create() {
        // Just ensure JobSpan::enter doesn't panic
        let _span = JobSpan::enter("test-analysis-id");
    }
}
