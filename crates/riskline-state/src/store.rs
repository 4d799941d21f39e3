//! Storage trait definition for riskline
//!
//! `AnalysisStore` persists analysis jobs and the per-failure-mode
//! results the pipeline produces for them. The trait is async and
//! backend-agnostic; the `memory` module provides the process-local
//! default backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use riskline_core::{AnalysisId, AnalysisJob, JobStatus, Operation, PfmeaResult};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Operations digest
// ---------------------------------------------------------------------------

/// Compute the SHA-256 hex digest of a job's operation list.
///
/// Fields are separated by NUL and records by an ASCII record separator,
/// so shifting text between adjacent fields changes the digest.
pub fn operations_digest(operations: &[Operation]) -> String {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    for op in operations {
        hasher.update(op.process.as_bytes());
        hasher.update(b"\0");
        if let Some(subprocess) = &op.subprocess {
            hasher.update(subprocess.as_bytes());
        }
        hasher.update(b"\0");
        if let Some(control_point) = &op.control_point {
            hasher.update(control_point.as_bytes());
        }
        hasher.update(b"\x1e");
    }
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// AnalysisStore — Job and Result Persistence
// ---------------------------------------------------------------------------

/// A stored job plus the digest of its operation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// The job itself (id, operations, status, timestamps)
    pub job: AnalysisJob,
    /// SHA-256 hex digest of the operation list, for change detection
    pub operations_digest: String,
}

/// Analysis job and result persistence.
///
/// Guarantees:
/// - A job transitions: Pending → Processing → Completed | Failed (terminal).
/// - Results can only be appended while the job is Processing.
/// - Results are returned in the order they were appended.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Create a new pending job for the given operations.
    async fn create_job(&self, operations: Vec<Operation>) -> StorageResult<JobRecord>;

    /// Move a pending job to processing.
    async fn mark_processing(&self, analysis_id: &AnalysisId) -> StorageResult<()>;

    /// Append a result to an active job. Fails if the job is not processing.
    async fn append_result(
        &self,
        analysis_id: &AnalysisId,
        result: PfmeaResult,
    ) -> StorageResult<()>;

    /// Mark a processing job as completed. `error_summary` describes any
    /// operations that produced no results.
    async fn complete_job(
        &self,
        analysis_id: &AnalysisId,
        error_summary: Option<String>,
    ) -> StorageResult<()>;

    /// Mark a processing job as failed.
    async fn fail_job(&self, analysis_id: &AnalysisId, reason: &str) -> StorageResult<()>;

    /// Retrieve a job record by id.
    async fn get_job(&self, analysis_id: &AnalysisId) -> StorageResult<JobRecord>;

    /// Retrieve all results for a job, in append order.
    async fn results(&self, analysis_id: &AnalysisId) -> StorageResult<Vec<PfmeaResult>>;

    /// List jobs, optionally filtered by status.
    async fn list_jobs(&self, status: Option<JobStatus>) -> StorageResult<Vec<JobRecord>>;
}
