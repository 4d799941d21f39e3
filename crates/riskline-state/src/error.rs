//! Error types for riskline-state

use thiserror::Error;

/// Errors returned by [`crate::AnalysisStore`] implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No job exists with the given analysis id
    #[error("analysis job not found: {analysis_id}")]
    JobNotFound { analysis_id: String },

    /// A status transition was attempted from the wrong state
    #[error("job {analysis_id} is {status}, expected {expected}")]
    InvalidJobState {
        analysis_id: String,
        status: String,
        expected: String,
    },

    /// Backend I/O or query failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}
