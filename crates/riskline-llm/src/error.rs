//! Error types for riskline-llm

use thiserror::Error;

/// Errors returned by [`crate::ModelClient`] implementations.
///
/// All three variants are transient from the pipeline's point of view:
/// the operation that triggered the call is eligible for retry.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model did not answer within the configured request timeout
    #[error("model request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The model service could not be reached or refused the request
    #[error("model service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    /// The model answered, but not with the JSON the stage asked for
    #[error("malformed model response: {reason}")]
    MalformedResponse { reason: String },
}
