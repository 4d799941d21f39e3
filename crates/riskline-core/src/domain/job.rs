//! Analysis jobs and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operation::Operation;

/// Unique identifier for an analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub String);

impl AnalysisId {
    /// Generate a new random id.
    pub fn new() -> Self {
        AnalysisId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an analysis job.
///
/// Transitions: Pending → Processing → Completed | Failed. A job completes
/// once every operation has been attempted, even when some operations
/// yielded no results; only an orchestration-level failure before the
/// first operation marks it Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job can still change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Lowercase form matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One end-to-end analysis run over an ordered list of operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    /// Unique identifier for this job.
    pub analysis_id: AnalysisId,

    /// Ordered operations to analyze.
    pub operations: Vec<Operation>,

    /// Current lifecycle status.
    pub status: JobStatus,

    /// When the job was submitted.
    pub created_at: DateTime<Utc>,

    /// When the job reached a terminal status (None until then).
    pub completed_at: Option<DateTime<Utc>>,

    /// Which operations failed, or why the whole job failed.
    pub error_summary: Option<String>,
}

impl AnalysisJob {
    /// Create a pending job over the given operations.
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            analysis_id: AnalysisId::new(),
            operations,
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            error_summary: None,
        }
    }
}
