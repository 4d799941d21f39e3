//! Stage response contracts
//!
//! Each stage asks the model for one specific JSON shape. Decoding is
//! strict: a shape mismatch is a `MalformedResponse` (the operation is
//! retried), never a partial parse. Ratings decode as raw `u8` so a
//! structurally valid answer carrying an out-of-range value surfaces as
//! `InvalidRating` (the candidate is dropped) rather than a retry.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use riskline_core::{Rating, StageName};
use riskline_llm::ModelError;

use crate::error::StageError;

/// One candidate failure mode from ANALYZE.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FailureCandidate {
    /// What could go wrong
    pub failure_mode: String,
    /// Impact on product or process if it does
    pub potential_effect: String,
}

/// ANALYZE response: candidate failure modes plus the model's reasoning.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub failure_modes: Vec<FailureCandidate>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// RATE (and CORRECT) response: raw ratings plus justification text.
#[derive(Debug, Clone, Deserialize)]
pub struct RateResponse {
    pub severity: u8,
    #[serde(default)]
    pub severity_justification: Option<String>,
    pub occurrence: u8,
    #[serde(default)]
    pub occurrence_justification: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Corrections suggested by VALIDATE; `None` means the rating stands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorrectedRatings {
    #[serde(default)]
    pub severity: Option<u8>,
    #[serde(default)]
    pub occurrence: Option<u8>,
}

/// VALIDATE response: verdict, issues, and suggested corrections.
///
/// Only `is_valid` is required; everything else defaults so a terse
/// verdict still decodes.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub corrected_ratings: CorrectedRatings,
    #[serde(default)]
    pub correction_reasoning: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Ratings validated against the 1-5 scale, ready for the risk engine.
#[derive(Debug, Clone)]
pub struct CandidateRating {
    pub severity: Rating,
    pub severity_justification: String,
    pub occurrence: Rating,
    pub occurrence_justification: String,
    pub reasoning: Option<String>,
}

impl CandidateRating {
    /// Validate the raw ratings of a decoded RATE/CORRECT response.
    pub fn from_response(stage: StageName, response: RateResponse) -> Result<Self, StageError> {
        let severity = Rating::new(response.severity)
            .map_err(|source| StageError::InvalidRating { stage, source })?;
        let occurrence = Rating::new(response.occurrence)
            .map_err(|source| StageError::InvalidRating { stage, source })?;
        Ok(Self {
            severity,
            severity_justification: response.severity_justification.unwrap_or_default(),
            occurrence,
            occurrence_justification: response.occurrence_justification.unwrap_or_default(),
            reasoning: response.reasoning,
        })
    }
}

fn decode<T: DeserializeOwned>(stage: StageName, raw: Value) -> Result<T, StageError> {
    serde_json::from_value(raw).map_err(|err| StageError::Model {
        stage,
        source: ModelError::MalformedResponse {
            reason: err.to_string(),
        },
    })
}

/// Decode an ANALYZE answer.
pub fn parse_analyze(raw: Value) -> Result<AnalyzeResponse, StageError> {
    decode(StageName::Analyze, raw)
}

/// Decode a RATE answer.
pub fn parse_rate(raw: Value) -> Result<RateResponse, StageError> {
    decode(StageName::Rate, raw)
}

/// Decode a VALIDATE answer.
pub fn parse_validate(raw: Value) -> Result<ValidateResponse, StageError> {
    decode(StageName::Validate, raw)
}

/// Decode a CORRECT answer (same shape as RATE).
pub fn parse_correct(raw: Value) -> Result<RateResponse, StageError> {
    decode(StageName::Correct, raw)
}
