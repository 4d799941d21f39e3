//! Progress events streamed by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::AnalysisId;

/// Pipeline stage (or boundary pseudo-stage) an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Analyze,
    Rate,
    Validate,
    Correct,
    Finalize,
    /// Operation-boundary events: started/completed/error per operation.
    Operation,
    /// Job-boundary events: started/completed/error per job.
    Job,
}

impl StageName {
    /// Lowercase form matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Analyze => "analyze",
            StageName::Rate => "rate",
            StageName::Validate => "validate",
            StageName::Correct => "correct",
            StageName::Finalize => "finalize",
            StageName::Operation => "operation",
            StageName::Job => "job",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened at the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Started,
    Completed,
    Error,
    Retry,
}

impl EventStatus {
    /// Lowercase form matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Started => "started",
            EventStatus::Completed => "completed",
            EventStatus::Error => "error",
            EventStatus::Retry => "retry",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A progress event streamed to subscribers.
///
/// Ephemeral by design: the pipeline emits and forgets. Delivery is
/// best-effort and at-most-once per subscriber, so consumers must
/// tolerate gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Job this event belongs to.
    pub analysis_id: AnalysisId,

    /// Stage (or boundary) that produced the event.
    pub stage: StageName,

    /// What happened.
    pub status: EventStatus,

    /// Human-readable message.
    pub message: String,

    /// Structured context: counts, ratings, records, retry delays.
    pub detail: serde_json::Value,

    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create a new event stamped now.
    pub fn new(
        analysis_id: AnalysisId,
        stage: StageName,
        status: EventStatus,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            analysis_id,
            stage,
            status,
            message: message.into(),
            detail,
            timestamp: Utc::now(),
        }
    }
}
