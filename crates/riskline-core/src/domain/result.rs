//! Finalized PFMEA records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::AnalysisId;
use crate::rating::Rating;
use crate::risk::{ActionRequired, RiskLevel};

/// One finalized failure-mode record.
///
/// Immutable once emitted. `rpn`, `risk_level`, and `action_required` are
/// derived from `severity` and `occurrence` through the risk matrix at
/// assembly time and are never updated independently of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PfmeaResult {
    /// Job this record belongs to.
    pub analysis_id: AnalysisId,

    /// Index of the source operation within the job.
    pub operation_index: usize,

    /// Process name copied from the source operation.
    pub process: String,

    /// Sub-process name copied from the source operation.
    pub subprocess: Option<String>,

    /// What could go wrong.
    pub failure_mode: String,

    /// Impact on product or process if it does.
    pub potential_effect: String,

    /// Severity rating (1-5).
    pub severity: Rating,

    /// Why the severity rating applies, with scale criteria appended.
    pub severity_justification: String,

    /// Occurrence rating (1-5).
    pub occurrence: Rating,

    /// Why the occurrence rating applies, with scale criteria appended.
    pub occurrence_justification: String,

    /// Risk Priority Number: severity × occurrence.
    pub rpn: u8,

    /// Risk level from the matrix.
    pub risk_level: RiskLevel,

    /// Whether follow-up action is required.
    pub action_required: ActionRequired,

    /// Control-point text copied from the source operation.
    pub control_point: Option<String>,

    /// 1.0 for first-pass results, reduced when a correction pass ran.
    pub confidence: f64,

    /// Model reasoning captured during ANALYZE.
    pub analysis_reasoning: Option<String>,

    /// Model reasoning captured during VALIDATE.
    pub validation_reasoning: Option<String>,

    /// Model reasoning captured during CORRECT.
    pub correction_reasoning: Option<String>,

    /// When the record was assembled.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskMatrix;

    #[test]
    fn test_serde_round_trip_keeps_derived_fields() {
        let severity = Rating::new(4).unwrap();
        let occurrence = Rating::new(3).unwrap();
        let classification = RiskMatrix::classify(severity, occurrence);
        let result = PfmeaResult {
            analysis_id: AnalysisId::new(),
            operation_index: 0,
            process: "Stamping".to_string(),
            subprocess: None,
            failure_mode: "Die misalignment".to_string(),
            potential_effect: "Out-of-spec panel dimensions".to_string(),
            severity,
            severity_justification: "Scrap across the batch".to_string(),
            occurrence,
            occurrence_justification: "Seen monthly".to_string(),
            rpn: classification.rpn,
            risk_level: classification.level,
            action_required: classification.action,
            control_point: Some("Gauge check".to_string()),
            confidence: 1.0,
            analysis_reasoning: None,
            validation_reasoning: None,
            correction_reasoning: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: PfmeaResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rpn, 12);
        assert_eq!(back.risk_level, RiskLevel::High);
        assert_eq!(back.action_required, ActionRequired::Yes);
        assert_eq!(back.severity, severity);
    }
}
