//! Error types for riskline-pipeline

use thiserror::Error;

use riskline_core::{RatingError, StageName};
use riskline_llm::ModelError;
use riskline_state::StorageError;

/// Errors raised while running one pipeline stage.
#[derive(Error, Debug)]
pub enum StageError {
    /// The model call behind the stage failed
    #[error("{stage} stage failed: {source}")]
    Model {
        stage: StageName,
        #[source]
        source: ModelError,
    },

    /// The model answered with a rating outside the 1-5 scale
    #[error("{stage} stage returned an invalid rating: {source}")]
    InvalidRating {
        stage: StageName,
        #[source]
        source: RatingError,
    },
}

impl StageError {
    /// Whether retrying the operation can help.
    ///
    /// Model failures are transient. An out-of-range rating is a contract
    /// violation scoped to one candidate; the candidate is dropped instead
    /// of retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, StageError::Model { .. })
    }

    /// The stage that raised the error.
    pub fn stage(&self) -> StageName {
        match self {
            StageError::Model { stage, .. } => *stage,
            StageError::InvalidRating { stage, .. } => *stage,
        }
    }
}

/// Errors that abort a whole analysis job.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The model service was unreachable before any operation was attempted
    #[error("orchestration failed: {reason}")]
    OrchestrationFatal { reason: String },

    /// The storage collaborator refused an update
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error returned by an event sink that could not deliver an event.
///
/// Sink failures are logged and swallowed by the pipeline; they exist as
/// a type so tests can inject them.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("event delivery failed: {reason}")]
    Delivery { reason: String },
}
