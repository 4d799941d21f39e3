//! Manufacturing operations under analysis.

use serde::{Deserialize, Serialize};

/// One manufacturing process step handed in by the extraction step.
///
/// Immutable for the lifetime of an analysis: the pipeline reads it, it
/// never writes it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Process name (e.g. "Final Assembly").
    pub process: String,

    /// Sub-process name when the step sits below the process level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subprocess: Option<String>,

    /// Equipment or control-point text, carried through to results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point: Option<String>,
}

impl Operation {
    /// Create an operation with only a process name.
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            subprocess: None,
            control_point: None,
        }
    }

    /// Attach a sub-process name.
    pub fn with_subprocess(mut self, subprocess: impl Into<String>) -> Self {
        self.subprocess = Some(subprocess.into());
        self
    }

    /// Attach control-point text.
    pub fn with_control_point(mut self, control_point: impl Into<String>) -> Self {
        self.control_point = Some(control_point.into());
        self
    }
}
