//! Riskline-Pipeline: Agentic PFMEA Analysis
//!
//! This crate drives a local model through the five-stage PFMEA loop for
//! every operation of an analysis job: ANALYZE enumerates failure-mode
//! candidates, RATE assigns severity and occurrence, VALIDATE critiques
//! the ratings against the scale criteria, CORRECT revises rejected
//! ratings once, and FINALIZE derives the risk fields deterministically.
//!
//! ## Key Components
//!
//! - `AnalysisOrchestrator`: runs one job sequentially to a terminal status
//! - `OperationProcessor`: the per-operation stage loop with retry/backoff
//! - `StageExecutor`: one model exchange per stage, decoded via `contracts`
//! - `EventSink` / `BroadcastSink`: non-blocking progress fan-out
//!
//! Transient model failures (timeouts, outages, malformed answers) retry
//! the whole operation from ANALYZE; an out-of-scale rating drops only
//! the offending candidate. Retry exhaustion marks the operation in the
//! job's error summary and the job still completes.

pub mod contracts;
mod error;
mod orchestrator;
mod processor;
pub mod prompts;
pub mod sink;
pub mod stages;

pub use error::{PipelineError, SinkError, StageError};
pub use orchestrator::{AnalysisOrchestrator, AnalysisReport, CancelHandle, OperationFailure};
pub use processor::{
    classify_attempt, AttemptOutcome, OperationOutcome, OperationProcessor, RetryPolicy,
};
pub use sink::{BroadcastSink, EventSink, NullSink};
pub use stages::{AnalyzeOutcome, FinalizeInput, StageExecutor};
