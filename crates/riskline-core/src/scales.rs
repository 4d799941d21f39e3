//! Rating-scale catalog: what each severity and occurrence level means.
//!
//! Static reference data consulted by prompt construction and appended to
//! stored justifications so every record stands on its own. Loaded once,
//! shared read-only by all concurrent jobs.

use crate::rating::Rating;

/// Which scale a rating belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Severity,
    Occurrence,
}

impl ScaleKind {
    /// Lowercase name ("severity" / "occurrence").
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleKind::Severity => "severity",
            ScaleKind::Occurrence => "occurrence",
        }
    }

    /// Uppercase name used in formatted justifications.
    pub fn upper(&self) -> &'static str {
        match self {
            ScaleKind::Severity => "SEVERITY",
            ScaleKind::Occurrence => "OCCURRENCE",
        }
    }
}

impl std::fmt::Display for ScaleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One level of a rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleLevel {
    /// Numeric rating this level describes.
    pub value: u8,
    /// Short label (e.g. "Catastrophic").
    pub label: &'static str,
    /// Criteria an assessment must meet for this level.
    pub criteria: &'static str,
}

/// Severity scale, highest first: how bad is the effect.
pub const SEVERITY_SCALE: [ScaleLevel; 5] = [
    ScaleLevel {
        value: 5,
        label: "Catastrophic",
        criteria: "total product loss, safety hazard, line shutdown",
    },
    ScaleLevel {
        value: 4,
        label: "Major",
        criteria: "significant defects, >10% scrap, major rework needed",
    },
    ScaleLevel {
        value: 3,
        label: "Moderate",
        criteria: "noticeable defects, some rework, customer complaint",
    },
    ScaleLevel {
        value: 2,
        label: "Minor",
        criteria: "slight defects, minor rework, internal detection",
    },
    ScaleLevel {
        value: 1,
        label: "Negligible",
        criteria: "barely noticeable, no real impact",
    },
];

/// Occurrence scale, highest first: how likely the failure is.
pub const OCCURRENCE_SCALE: [ScaleLevel; 5] = [
    ScaleLevel {
        value: 5,
        label: "Very High",
        criteria: "happens frequently, poor process control",
    },
    ScaleLevel {
        value: 4,
        label: "High",
        criteria: "happens regularly, known recurring issue",
    },
    ScaleLevel {
        value: 3,
        label: "Moderate",
        criteria: "occasional failures, inconsistent process",
    },
    ScaleLevel {
        value: 2,
        label: "Low",
        criteria: "rare failures, good process control",
    },
    ScaleLevel {
        value: 1,
        label: "Very Low",
        criteria: "extremely rare, excellent controls",
    },
];

/// Look up the scale level for a validated rating.
pub fn level(kind: ScaleKind, rating: Rating) -> &'static ScaleLevel {
    let scale = match kind {
        ScaleKind::Severity => &SEVERITY_SCALE,
        ScaleKind::Occurrence => &OCCURRENCE_SCALE,
    };
    // Scales are ordered 5..1, so index from the top.
    &scale[(Rating::MAX - rating.value()) as usize]
}

/// Render both scales as a plain-text block for prompt embedding.
pub fn prompt_block() -> String {
    let mut out = String::from("SEVERITY SCALE (how bad is the effect):\n");
    for entry in &SEVERITY_SCALE {
        out.push_str(&format!(
            "{} = {} - {}\n",
            entry.value, entry.label, entry.criteria
        ));
    }
    out.push_str("\nOCCURRENCE SCALE (how likely to happen):\n");
    for entry in &OCCURRENCE_SCALE {
        out.push_str(&format!(
            "{} = {} - {}\n",
            entry.value, entry.label, entry.criteria
        ));
    }
    out
}

/// Append the matching scale criteria to a model-written justification so
/// the stored text is self-contained. Falls back to a fixed sentence when
/// the model supplied no justification.
pub fn format_justification(kind: ScaleKind, rating: Rating, justification: &str) -> String {
    if justification.trim().is_empty() {
        return format!("Rating {} assigned based on scale criteria", rating);
    }
    let criteria = level(kind, rating).criteria;
    format!(
        "{}\n\nCriteria for {}={}: {}",
        justification,
        kind.upper(),
        rating,
        criteria
    )
}
