//! Stage execution: one model exchange per agentic stage.
//!
//! `StageExecutor` owns the model client and the shared system prompt.
//! ANALYZE, RATE, VALIDATE, and CORRECT each build a prompt, call the
//! model, and decode the answer through the contracts module. FINALIZE
//! is deterministic assembly and never touches the model.

use std::sync::Arc;

use chrono::Utc;
use riskline_core::{scales, AnalysisId, Operation, PfmeaResult, RiskMatrix, ScaleKind, StageName};
use riskline_llm::{ModelClient, ModelRequest};
use serde_json::Value;

use crate::contracts::{self, CandidateRating, FailureCandidate, ValidateResponse};
use crate::error::StageError;
use crate::prompts;

/// Candidates surviving the ANALYZE decode, plus the model's reasoning.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub candidates: Vec<FailureCandidate>,
    pub reasoning: Option<String>,
}

/// Everything FINALIZE needs to assemble one record.
pub struct FinalizeInput<'a> {
    pub analysis_id: &'a AnalysisId,
    pub operation_index: usize,
    pub operation: &'a Operation,
    pub candidate: &'a FailureCandidate,
    pub rating: &'a CandidateRating,
    pub analysis_reasoning: Option<String>,
    pub validation_reasoning: Option<String>,
    pub correction_reasoning: Option<String>,
    /// Correction passes applied to this candidate (0 or 1).
    pub corrections: u32,
}

/// Runs individual pipeline stages against the model.
pub struct StageExecutor {
    client: Arc<dyn ModelClient>,
    system_prompt: String,
}

impl StageExecutor {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            system_prompt: prompts::system_prompt(),
        }
    }

    async fn call(&self, stage: StageName, prompt: String) -> Result<Value, StageError> {
        let request = ModelRequest::new(self.system_prompt.clone(), prompt);
        self.client
            .generate(request)
            .await
            .map_err(|source| StageError::Model { stage, source })
    }

    /// ANALYZE: enumerate failure-mode candidates for one operation.
    ///
    /// Candidates with a blank failure mode or effect are dropped here;
    /// they carry nothing worth rating.
    pub async fn analyze(&self, operation: &Operation) -> Result<AnalyzeOutcome, StageError> {
        let raw = self
            .call(StageName::Analyze, prompts::analyze_prompt(operation))
            .await?;
        let response = contracts::parse_analyze(raw)?;

        let mut candidates = Vec::with_capacity(response.failure_modes.len());
        for candidate in response.failure_modes {
            if candidate.failure_mode.trim().is_empty()
                || candidate.potential_effect.trim().is_empty()
            {
                tracing::debug!(
                    process = %operation.process,
                    "dropping blank failure-mode candidate"
                );
                continue;
            }
            candidates.push(candidate);
        }

        Ok(AnalyzeOutcome {
            candidates,
            reasoning: response.reasoning,
        })
    }

    /// RATE: severity and occurrence for one candidate.
    pub async fn rate(
        &self,
        candidate: &FailureCandidate,
        operation: &Operation,
    ) -> Result<CandidateRating, StageError> {
        let raw = self
            .call(StageName::Rate, prompts::rate_prompt(candidate, operation))
            .await?;
        let response = contracts::parse_rate(raw)?;
        CandidateRating::from_response(StageName::Rate, response)
    }

    /// VALIDATE: self-critique of a rating against the scale criteria.
    pub async fn validate(
        &self,
        candidate: &FailureCandidate,
        rating: &CandidateRating,
    ) -> Result<ValidateResponse, StageError> {
        let raw = self
            .call(
                StageName::Validate,
                prompts::validate_prompt(candidate, rating),
            )
            .await?;
        contracts::parse_validate(raw)
    }

    /// CORRECT: one revision pass guided by the validation verdict.
    pub async fn correct(
        &self,
        candidate: &FailureCandidate,
        rating: &CandidateRating,
        verdict: &ValidateResponse,
    ) -> Result<CandidateRating, StageError> {
        let raw = self
            .call(
                StageName::Correct,
                prompts::correct_prompt(candidate, rating, verdict),
            )
            .await?;
        let response = contracts::parse_correct(raw)?;
        CandidateRating::from_response(StageName::Correct, response)
    }

    /// FINALIZE: derive the risk fields and assemble the record.
    ///
    /// Infallible: ratings were validated upstream and the risk matrix is
    /// total over them.
    pub fn finalize(&self, input: FinalizeInput<'_>) -> PfmeaResult {
        let rating = input.rating;
        let classification = RiskMatrix::classify(rating.severity, rating.occurrence);
        let confidence = 1.0 - 0.2 * f64::from(input.corrections);

        PfmeaResult {
            analysis_id: input.analysis_id.clone(),
            operation_index: input.operation_index,
            process: input.operation.process.clone(),
            subprocess: input.operation.subprocess.clone(),
            failure_mode: input.candidate.failure_mode.clone(),
            potential_effect: input.candidate.potential_effect.clone(),
            severity: rating.severity,
            severity_justification: scales::format_justification(
                ScaleKind::Severity,
                rating.severity,
                &rating.severity_justification,
            ),
            occurrence: rating.occurrence,
            occurrence_justification: scales::format_justification(
                ScaleKind::Occurrence,
                rating.occurrence,
                &rating.occurrence_justification,
            ),
            rpn: classification.rpn,
            risk_level: classification.level,
            action_required: classification.action,
            control_point: input.operation.control_point.clone(),
            confidence,
            analysis_reasoning: input.analysis_reasoning,
            validation_reasoning: input.validation_reasoning,
            correction_reasoning: input.correction_reasoning,
            created_at: Utc::now(),
        }
    }
}
