//! Global atomic counters for riskline observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of an analysis job).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    jobs_completed: AtomicU64,
    operations_processed: AtomicU64,
    model_calls: AtomicU64,
    retries_scheduled: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            jobs_completed: AtomicU64::new(0),
            operations_processed: AtomicU64::new(0),
            model_calls: AtomicU64::new(0),
            retries_scheduled: AtomicU64::new(0),
        }
    }

    /// Increment the jobs-completed counter by one.
    pub fn inc_jobs_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "jobs_completed", "counter incremented");
    }

    /// Increment the operations-processed counter by one.
    pub fn inc_operations_processed(&self) {
        self.operations_processed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "operations_processed", "counter incremented");
    }

    /// Increment the model-calls counter by one.
    pub fn inc_model_calls(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "model_calls", "counter incremented");
    }

    /// Increment the retries-scheduled counter by one.
    pub fn inc_retries_scheduled(&self) {
        self.retries_scheduled.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "retries_scheduled", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a job, daemon tick, etc.)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            jobs_completed = self.jobs_completed(),
            operations_processed = self.operations_processed(),
            model_calls = self.model_calls(),
            retries_scheduled = self.retries_scheduled(),
        );
    }

    /// Read the current jobs-completed count.
    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Read the current operations-processed count.
    pub fn operations_processed(&self) -> u64 {
        self.operations_processed.load(Ordering::Relaxed)
    }

    /// Read the current model-calls count.
    pub fn model_calls(&self) -> u64 {
        self.model_calls.load(Ordering::Relaxed)
    }

    /// Read the current retries-scheduled count.
    pub fn retries_scheduled(&self) -> u64 {
        self.retries_scheduled.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.jobs_completed.store(0, Ordering::Relaxed);
        self.operations_processed.store(0, Ordering::Relaxed);
        self.model_calls.store(0, Ordering::Relaxed);
        self.retries_scheduled.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.jobs_completed(), 0);
        m.inc_jobs_completed();
        m.inc_jobs_completed();
        assert_eq!(m.jobs_completed(), 2);

        m.inc_operations_processed();
        assert_eq!(m.operations_processed(), 1);

        m.inc_model_calls();
        m.inc_model_calls();
        m.inc_model_calls();
        assert_eq!(m.model_calls(), 3);

        m.inc_retries_scheduled();
        assert_eq!(m.retries_scheduled(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_jobs_completed();
        m.inc_operations_processed();
        m.inc_model_calls();
        m.inc_retries_scheduled();
        m.reset();
        assert_eq!(m.jobs_completed(), 0);
        assert_eq!(m.operations_processed(), 0);
        assert_eq!(m.model_calls(), 0);
        assert_eq!(m.retries_scheduled(), 0);
    }
}
