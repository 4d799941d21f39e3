//! Riskline-State: Persistence for Analysis Jobs
//!
//! This crate provides the persistence layer for the PFMEA validation
//! pipeline. An [`AnalysisStore`] holds each analysis job, its status
//! transitions, and the validated results appended as the pipeline
//! works through the job's operations.
//!
//! ## Key Components
//!
//! - `AnalysisStore`: backend-agnostic async trait
//! - `JobRecord`: a stored job plus the digest of its operation list
//! - `MemoryAnalysisStore`: process-local default backend

mod error;
pub mod memory;
pub mod store;

pub use error::StorageError;
pub use memory::MemoryAnalysisStore;
pub use store::{operations_digest, AnalysisStore, JobRecord, StorageResult};
