//! Prompt construction for the five pipeline stages.
//!
//! Prompts spell out the exact JSON structure expected back; the
//! contracts module decodes against those shapes. The rating scales are
//! embedded once in the system prompt so every stage shares the same
//! definitions.

use riskline_core::{scales, Operation, ScaleKind};

use crate::contracts::{CandidateRating, FailureCandidate, ValidateResponse};

/// System prompt establishing the analyst role and the rating scales.
pub fn system_prompt() -> String {
    format!(
        r#"You are an expert in Process Failure Mode and Effects Analysis (PFMEA).
Your task is to analyze manufacturing processes and identify potential failure modes, their effects, and assign appropriate ratings.

RATING SCALES:
{}
You must:
1. Accurately identify failure modes based on process steps
2. Assess potential effects on product performance and manufacturing
3. Assign ratings (1-5) that match the scale criteria exactly
4. Provide clear justifications for each rating
5. Be thorough and conservative in your assessments

Always output valid JSON with the exact structure requested."#,
        scales::prompt_block()
    )
}

fn operation_context(operation: &Operation) -> String {
    format!(
        "- Process: {}\n- Sub-Process: {}\n- Control Points: {}",
        operation.process,
        operation
            .subprocess
            .as_deref()
            .unwrap_or("N/A (main process level)"),
        operation.control_point.as_deref().unwrap_or("N/A"),
    )
}

/// ANALYZE: enumerate failure modes for one operation.
pub fn analyze_prompt(operation: &Operation) -> String {
    format!(
        r#"Analyze the following manufacturing work instruction and identify potential failure modes.

WORK INSTRUCTION INFORMATION:
{}

Your task is to identify potential failure modes for this work instruction step. Consider:
- What could go wrong during this process/subprocess?
- What are the potential effects on the product or manufacturing process?
- Think about human error, equipment failure, material issues, environmental factors, etc.

For each potential failure mode, identify:
1. The failure mode (what could go wrong - be specific to this process/subprocess)
2. The potential effect (impact on product performance, manufacturing process, or safety)

IMPORTANT: The failure modes should be specific to the work instruction step being analyzed.
If a subprocess is provided, focus on failure modes for that specific subprocess.
If only a main process is provided, identify failure modes at the process level.

Output JSON with this structure:
{{
  "failure_modes": [
    {{
      "failure_mode": "specific description of what could fail in this step",
      "potential_effect": "description of the impact on product or process"
    }}
  ],
  "reasoning": "explanation of your analysis"
}}"#,
        operation_context(operation)
    )
}

/// RATE: severity and occurrence for one candidate.
pub fn rate_prompt(candidate: &FailureCandidate, operation: &Operation) -> String {
    format!(
        r#"Rate the following failure mode using the provided scales.

FAILURE MODE: {}
POTENTIAL EFFECT: {}

PROCESS CONTEXT:
{}

Assign ratings (1-5) for:
1. SEVERITY: Impact of the effect on product performance and manufacturing
2. OCCURRENCE: Likelihood of the failure occurring

For each rating, provide:
- The rating value (1-5)
- Detailed justification explaining why this rating matches the scale criteria

Output JSON with this structure:
{{
  "severity": <1-5>,
  "severity_justification": "detailed explanation",
  "occurrence": <1-5>,
  "occurrence_justification": "detailed explanation",
  "reasoning": "overall reasoning for the ratings"
}}"#,
        candidate.failure_mode,
        candidate.potential_effect,
        operation_context(operation),
    )
}

/// VALIDATE: self-critique of a rating against the scale criteria.
pub fn validate_prompt(candidate: &FailureCandidate, rating: &CandidateRating) -> String {
    let severity_criteria = scales::level(ScaleKind::Severity, rating.severity).criteria;
    let occurrence_criteria = scales::level(ScaleKind::Occurrence, rating.occurrence).criteria;

    format!(
        r#"Review and validate the following PFMEA ratings for consistency.

FAILURE MODE: {}
POTENTIAL EFFECT: {}

CURRENT RATINGS:
- Severity: {}
  Justification: {}
  Scale Criteria for {}: {}

- Occurrence: {}
  Justification: {}
  Scale Criteria for {}: {}

Check if:
1. Each rating matches its scale criteria
2. The justifications support the assigned ratings
3. The ratings are consistent with each other
4. Any ratings need adjustment

Output JSON with this structure:
{{
  "is_valid": true/false,
  "issues": ["list of any issues found"],
  "corrected_ratings": {{
    "severity": <1-5 or null if correct>,
    "occurrence": <1-5 or null if correct>
  }},
  "correction_reasoning": "explanation of any corrections needed",
  "reasoning": "assessment of the ratings"
}}"#,
        candidate.failure_mode,
        candidate.potential_effect,
        rating.severity,
        non_empty(&rating.severity_justification),
        rating.severity,
        severity_criteria,
        rating.occurrence,
        non_empty(&rating.occurrence_justification),
        rating.occurrence,
        occurrence_criteria,
    )
}

/// CORRECT: one revision pass guided by the validation verdict.
pub fn correct_prompt(
    candidate: &FailureCandidate,
    rating: &CandidateRating,
    verdict: &ValidateResponse,
) -> String {
    let issues = if verdict.issues.is_empty() {
        "- Ratings need adjustment".to_string()
    } else {
        verdict
            .issues
            .iter()
            .map(|issue| format!("- {issue}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let suggested = format!(
        "severity={}, occurrence={}",
        suggestion(verdict.corrected_ratings.severity),
        suggestion(verdict.corrected_ratings.occurrence),
    );

    format!(
        r#"Revise the following PFMEA ratings based on validation feedback.

FAILURE MODE: {}
POTENTIAL EFFECT: {}

PREVIOUS RATINGS: Severity={}, Occurrence={}

VALIDATION ISSUES:
{}

SUGGESTED CORRECTIONS: {}

Assign corrected ratings (1-5) that address the issues above, with justifications grounded in the scale criteria.

Output JSON with this structure:
{{
  "severity": <1-5>,
  "severity_justification": "detailed explanation",
  "occurrence": <1-5>,
  "occurrence_justification": "detailed explanation",
  "reasoning": "how the corrections address the validation feedback"
}}"#,
        candidate.failure_mode,
        candidate.potential_effect,
        rating.severity,
        rating.occurrence,
        issues,
        suggested,
    )
}

fn non_empty(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

fn suggestion(value: Option<u8>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "keep current".to_string(),
    }
}
