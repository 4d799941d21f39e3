//! Deterministic risk classification: RPN plus the severity/occurrence matrix.

use serde::{Deserialize, Serialize};

use crate::error::RatingError;
use crate::rating::Rating;

/// Risk level assigned by the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Action flag this risk level maps to.
    pub fn action_required(&self) -> ActionRequired {
        match self {
            RiskLevel::High => ActionRequired::Yes,
            RiskLevel::Medium => ActionRequired::Maybe,
            RiskLevel::Low => ActionRequired::No,
        }
    }

    /// Lowercase form matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    /// Worksheet form ("Low", "Medium", "High").
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        write!(f, "{}", label)
    }
}

/// Whether follow-up action is required for a classified failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRequired {
    Yes,
    Maybe,
    No,
}

impl std::fmt::Display for ActionRequired {
    /// Worksheet form ("Yes", "Maybe", "No").
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActionRequired::Yes => "Yes",
            ActionRequired::Maybe => "Maybe",
            ActionRequired::No => "No",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of classifying one severity/occurrence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskClassification {
    /// Risk Priority Number: severity × occurrence, 1-25.
    pub rpn: u8,
    /// Risk level from the matrix row for this severity.
    pub level: RiskLevel,
    /// Action flag derived from the level.
    pub action: ActionRequired,
}

/// The fixed 5×5 severity/occurrence risk matrix.
///
/// Thresholds are defined per severity row rather than as a single global
/// RPN cutoff: the same RPN can carry different risk at different
/// severities (RPN 4 is Low at S=2/O=2 but Medium at S=1/O=4).
pub struct RiskMatrix;

impl RiskMatrix {
    // Row = severity 1..5, column = occurrence 1..5.
    const TABLE: [[RiskLevel; 5]; 5] = {
        use RiskLevel::{High, Low, Medium};
        [
            [Low, Low, Low, Medium, Medium],
            [Low, Low, Low, Medium, Medium],
            [Low, Low, Medium, High, High],
            [Medium, Medium, High, High, High],
            [Medium, Medium, High, High, High],
        ]
    };

    /// Classify a validated severity/occurrence pair.
    ///
    /// Pure lookup, no I/O. The returned classification is internally
    /// consistent: `rpn` is always the product of the two inputs and
    /// `action` always follows from `level`.
    pub fn classify(severity: Rating, occurrence: Rating) -> RiskClassification {
        let level =
            Self::TABLE[(severity.value() - 1) as usize][(occurrence.value() - 1) as usize];
        RiskClassification {
            rpn: severity.value() * occurrence.value(),
            level,
            action: level.action_required(),
        }
    }

    /// Classify raw values, rejecting anything outside the 1-5 scale.
    ///
    /// Out-of-range input fails fast with [`RatingError::OutOfRange`];
    /// it is never clamped.
    pub fn classify_values(severity: u8, occurrence: u8) -> Result<RiskClassification, RatingError> {
        Ok(Self::classify(Rating::new(severity)?, Rating::new(occurrence)?))
    }
}
