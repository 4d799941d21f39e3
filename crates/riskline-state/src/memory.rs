//! In-memory analysis store
//!
//! `MemoryAnalysisStore` keeps jobs and results in a process-local map.
//! Analysis jobs are short-lived and exported on completion, so this is
//! the default backend for the CLI as well as the store used throughout
//! the tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use riskline_core::{AnalysisId, AnalysisJob, JobStatus, Operation, PfmeaResult};

use crate::error::StorageError;
use crate::store::{operations_digest, AnalysisStore, JobRecord, StorageResult};

#[derive(Debug)]
struct JobState {
    record: JobRecord,
    results: Vec<PfmeaResult>,
}

/// In-memory analysis store backed by a `HashMap<analysis_id, JobState>`.
#[derive(Debug, Default)]
pub struct MemoryAnalysisStore {
    jobs: Mutex<HashMap<String, JobState>>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_status(record: &JobRecord, expected: JobStatus) -> StorageResult<()> {
    if record.job.status != expected {
        return Err(StorageError::InvalidJobState {
            analysis_id: record.job.analysis_id.to_string(),
            status: record.job.status.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn create_job(&self, operations: Vec<Operation>) -> StorageResult<JobRecord> {
        let digest = operations_digest(&operations);
        let record = JobRecord {
            job: AnalysisJob::new(operations),
            operations_digest: digest,
        };
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(
            record.job.analysis_id.to_string(),
            JobState {
                record: record.clone(),
                results: Vec::new(),
            },
        );
        Ok(record)
    }

    async fn mark_processing(&self, analysis_id: &AnalysisId) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get_mut(&analysis_id.0)
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })?;
        ensure_status(&state.record, JobStatus::Pending)?;
        state.record.job.status = JobStatus::Processing;
        Ok(())
    }

    async fn append_result(
        &self,
        analysis_id: &AnalysisId,
        result: PfmeaResult,
    ) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get_mut(&analysis_id.0)
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })?;
        ensure_status(&state.record, JobStatus::Processing)?;
        state.results.push(result);
        Ok(())
    }

    async fn complete_job(
        &self,
        analysis_id: &AnalysisId,
        error_summary: Option<String>,
    ) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get_mut(&analysis_id.0)
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })?;
        ensure_status(&state.record, JobStatus::Processing)?;
        state.record.job.status = JobStatus::Completed;
        state.record.job.error_summary = error_summary;
        state.record.job.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn fail_job(&self, analysis_id: &AnalysisId, reason: &str) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get_mut(&analysis_id.0)
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })?;
        ensure_status(&state.record, JobStatus::Processing)?;
        state.record.job.status = JobStatus::Failed;
        state.record.job.error_summary = Some(reason.to_string());
        state.record.job.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn get_job(&self, analysis_id: &AnalysisId) -> StorageResult<JobRecord> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(&analysis_id.0)
            .map(|s| s.record.clone())
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })
    }

    async fn results(&self, analysis_id: &AnalysisId) -> StorageResult<Vec<PfmeaResult>> {
        let jobs = self.jobs.lock().unwrap();
        let state = jobs
            .get(&analysis_id.0)
            .ok_or_else(|| StorageError::JobNotFound {
                analysis_id: analysis_id.0.clone(),
            })?;
        Ok(state.results.clone())
    }

    async fn list_jobs(&self, status: Option<JobStatus>) -> StorageResult<Vec<JobRecord>> {
        let jobs = self.jobs.lock().unwrap();
        let mut records: Vec<JobRecord> = jobs
            .values()
            .filter(|s| status.map(|st| s.record.job.status == st).unwrap_or(true))
            .map(|s| s.record.clone())
            .collect();
        records.sort_by(|a, b| a.job.created_at.cmp(&b.job.created_at));
        Ok(records)
    }
}
