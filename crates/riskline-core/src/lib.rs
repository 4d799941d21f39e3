//! Riskline Core Library
//!
//! Domain model for the PFMEA validation pipeline: manufacturing
//! operations, analysis jobs, validated ratings, the deterministic risk
//! matrix, the rating-scale catalog, and the progress events the pipeline
//! streams to subscribers.

pub mod domain;
pub mod error;
pub mod event;
pub mod metrics;
pub mod obs;
pub mod rating;
pub mod risk;
pub mod scales;
pub mod telemetry;

pub use domain::{AnalysisId, AnalysisJob, JobStatus, Operation, PfmeaResult};
pub use error::RatingError;
pub use event::{EventStatus, ProgressEvent, StageName};
pub use rating::Rating;
pub use risk::{ActionRequired, RiskClassification, RiskLevel, RiskMatrix};
pub use scales::{ScaleKind, ScaleLevel, OCCURRENCE_SCALE, SEVERITY_SCALE};

pub use metrics::METRICS;
pub use obs::{
    emit_job_completed, emit_job_failed, emit_job_started, emit_operation_completed,
    emit_operation_exhausted, emit_operation_started, emit_retry_scheduled, emit_sink_error,
    emit_stage_failed, JobSpan,
};
pub use telemetry::init_tracing;

/// Riskline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
