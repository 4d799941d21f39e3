//! Domain models for riskline.
//!
//! Canonical definitions for the core entities:
//! - `Operation`: one manufacturing process step under analysis
//! - `AnalysisJob`: an end-to-end analysis run over a list of operations
//! - `PfmeaResult`: one finalized failure-mode record

pub mod job;
pub mod operation;
pub mod result;

pub use job::{AnalysisId, AnalysisJob, JobStatus};
pub use operation::Operation;
pub use result::PfmeaResult;
