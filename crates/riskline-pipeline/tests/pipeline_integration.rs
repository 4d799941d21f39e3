//! End-to-end pipeline tests over scripted model responses.
//!
//! These drive `AnalysisOrchestrator` against the in-memory store and
//! the scripted model client, covering the retry schedule, failure
//! isolation, candidate drops, correction passes, cancellation, and
//! event ordering.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use riskline_core::{AnalysisId, EventStatus, JobStatus, Operation, ProgressEvent, StageName};
use riskline_llm::fakes::ScriptedModelClient;
use riskline_llm::ModelError;
use riskline_pipeline::{
    AnalysisOrchestrator, AnalysisReport, CancelHandle, EventSink, NullSink, PipelineError,
    SinkError,
};
use riskline_state::{AnalysisStore, MemoryAnalysisStore};
use serde_json::{json, Value};

// ===========================================================================
// Test sinks
// ===========================================================================

/// Records every published event for later assertions.
#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingSink {
    fn publish(&self, event: ProgressEvent) -> Result<(), SinkError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Refuses every event, as a closed subscriber channel would.
struct FailingSink;

impl EventSink for FailingSink {
    fn publish(&self, _event: ProgressEvent) -> Result<(), SinkError> {
        Err(SinkError::Delivery {
            reason: "subscriber channel closed".to_string(),
        })
    }
}

/// Cancels the run as soon as the first operation completes.
struct CancellingSink {
    handle: CancelHandle,
}

impl EventSink for CancellingSink {
    fn publish(&self, event: ProgressEvent) -> Result<(), SinkError> {
        if event.stage == StageName::Operation && event.status == EventStatus::Completed {
            self.handle.cancel();
        }
        Ok(())
    }
}

// ===========================================================================
// Script helpers
// ===========================================================================

fn analyze_json(modes: &[(&str, &str)]) -> Value {
    let failure_modes: Vec<Value> = modes
        .iter()
        .map(|(mode, effect)| json!({"failure_mode": mode, "potential_effect": effect}))
        .collect();
    json!({"failure_modes": failure_modes, "reasoning": "scripted analysis"})
}

fn rate_json(severity: u8, occurrence: u8) -> Value {
    json!({
        "severity": severity,
        "severity_justification": "scripted severity justification",
        "occurrence": occurrence,
        "occurrence_justification": "scripted occurrence justification",
        "reasoning": "scripted rating"
    })
}

fn validate_ok_json() -> Value {
    json!({
        "is_valid": true,
        "issues": [],
        "corrected_ratings": {"severity": null, "occurrence": null},
        "correction_reasoning": null,
        "reasoning": "ratings line up with the scales"
    })
}

fn validate_reject_json(issue: &str, severity: Option<u8>, occurrence: Option<u8>) -> Value {
    json!({
        "is_valid": false,
        "issues": [issue],
        "corrected_ratings": {"severity": severity, "occurrence": occurrence},
        "correction_reasoning": "scripted correction hint",
        "reasoning": "found a mismatch"
    })
}

/// Queue one full first-pass operation: analyze, rate, validate-ok.
fn enqueue_good_operation(client: &ScriptedModelClient, mode: &str) {
    client.enqueue_json(analyze_json(&[(mode, "scripted effect")]));
    client.enqueue_json(rate_json(3, 2));
    client.enqueue_json(validate_ok_json());
}

async fn create_job(
    store: &Arc<MemoryAnalysisStore>,
    operations: Vec<Operation>,
) -> AnalysisId {
    store
        .create_job(operations)
        .await
        .unwrap()
        .job
        .analysis_id
        .clone()
}

fn orchestrator(
    store: &Arc<MemoryAnalysisStore>,
    client: &Arc<ScriptedModelClient>,
    sink: Arc<dyn EventSink>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(store.clone(), client.clone(), sink)
}

fn retry_events(events: &[ProgressEvent]) -> Vec<ProgressEvent> {
    events
        .iter()
        .filter(|e| e.status == EventStatus::Retry)
        .cloned()
        .collect()
}

// ===========================================================================
// Retry schedule
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn transient_failures_retry_with_exponential_backoff() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let sink = Arc::new(CollectingSink::default());

    // Two timeouts, then a clean pass on the third attempt.
    client.enqueue_error(ModelError::Timeout { timeout_secs: 300 });
    client.enqueue_error(ModelError::Timeout { timeout_secs: 300 });
    enqueue_good_operation(&client, "Tool wear");

    let analysis_id = create_job(&store, vec![Operation::new("CNC Milling")]).await;
    let started = tokio::time::Instant::now();
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    // Backoff is 1s then 2s; paused time advances by exactly that.
    assert_eq!(started.elapsed(), Duration::from_millis(3_000));

    let retries = retry_events(&sink.events());
    assert_eq!(retries.len(), 2);
    assert_eq!(retries[0].detail["delay_ms"], 1_000);
    assert_eq!(retries[0].detail["attempt"], 1);
    assert_eq!(retries[1].detail["delay_ms"], 2_000);
    assert_eq!(retries[1].detail["attempt"], 2);

    assert_eq!(report.results.len(), 1);
    assert!(report.failures.is_empty());
    assert_eq!(client.remaining(), 0);

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
    assert_eq!(record.job.error_summary, None);
}

// ===========================================================================
// Failure isolation
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn exhausted_operation_does_not_fail_the_job() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let sink = Arc::new(CollectingSink::default());

    // First operation answers garbage on all three attempts.
    for _ in 0..3 {
        client.enqueue_json(json!({"unexpected": "shape"}));
    }
    enqueue_good_operation(&client, "Masking tape misapplied");

    let analysis_id = create_job(
        &store,
        vec![Operation::new("Welding"), Operation::new("Painting")],
    )
    .await;
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].process, "Painting");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert_eq!(report.failures[0].process, "Welding");

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
    let summary = record.job.error_summary.unwrap();
    assert!(summary.contains("1 of 2 operations produced no results"));
    assert!(summary.contains("operation 0 (Welding)"));

    // The failed operation raised an operation-level error event.
    let events = sink.events();
    assert!(events.iter().any(|e| {
        e.stage == StageName::Operation
            && e.status == EventStatus::Error
            && e.detail["operation_index"] == 0
    }));

    let stored = store.results(&analysis_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].process, "Painting");
}

#[tokio::test]
async fn invalid_rating_drops_only_that_candidate() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let sink = Arc::new(CollectingSink::default());

    client.enqueue_json(analyze_json(&[
        ("Fixture slips", "Part shifts during milling"),
        ("Coolant starvation", "Thermal damage to the part"),
    ]));
    // First candidate gets an out-of-scale severity and is dropped.
    client.enqueue_json(rate_json(7, 2));
    client.enqueue_json(rate_json(4, 2));
    client.enqueue_json(validate_ok_json());

    let analysis_id = create_job(&store, vec![Operation::new("CNC Milling")]).await;
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].failure_mode, "Coolant starvation");
    assert!(report.failures.is_empty());

    let events = sink.events();
    // The drop is not a retry; it surfaces as a rate-stage error event.
    assert!(retry_events(&events).is_empty());
    assert!(events
        .iter()
        .any(|e| e.stage == StageName::Rate && e.status == EventStatus::Error));

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
    assert_eq!(record.job.error_summary, None);
}

// ===========================================================================
// Correction pass
// ===========================================================================

#[tokio::test]
async fn rejected_ratings_get_one_correction_pass() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let sink = Arc::new(CollectingSink::default());

    client.enqueue_json(analyze_json(&[("Seal seated off-center", "Coolant leak")]));
    client.enqueue_json(rate_json(2, 2));
    client.enqueue_json(validate_reject_json(
        "severity understates the leak impact",
        Some(4),
        None,
    ));
    client.enqueue_json(json!({
        "severity": 4,
        "severity_justification": "leak fails the pressure test",
        "occurrence": 2,
        "occurrence_justification": "press force is monitored",
        "reasoning": "raised severity per validation"
    }));

    let analysis_id = create_job(&store, vec![Operation::new("Seal press")]).await;
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.severity.value(), 4);
    assert_eq!(result.occurrence.value(), 2);
    assert_eq!(result.rpn, 8);
    assert!((result.confidence - 0.8).abs() < f64::EPSILON);
    assert_eq!(
        result.correction_reasoning.as_deref(),
        Some("raised severity per validation")
    );
    assert_eq!(result.validation_reasoning.as_deref(), Some("found a mismatch"));

    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| e.stage == StageName::Correct && e.status == EventStatus::Completed));
}

// ===========================================================================
// Job boundaries
// ===========================================================================

#[tokio::test]
async fn empty_job_completes_without_model_contact() {
    let store = Arc::new(MemoryAnalysisStore::new());
    // Offline: would fail preflight if the pipeline reached it.
    let client = Arc::new(ScriptedModelClient::offline());
    let sink = Arc::new(CollectingSink::default());

    let analysis_id = create_job(&store, Vec::new()).await;
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    assert!(report.results.is_empty());
    assert!(report.failures.is_empty());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stage, StageName::Job);
    assert_eq!(events[0].status, EventStatus::Started);
    assert_eq!(events[1].status, EventStatus::Completed);

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
    assert_eq!(record.job.error_summary, None);
}

#[tokio::test]
async fn unreachable_model_fails_the_job_up_front() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::offline());
    let sink = Arc::new(CollectingSink::default());

    let analysis_id = create_job(&store, vec![Operation::new("Welding")]).await;
    let err = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::OrchestrationFatal { .. }));

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Failed);
    assert_eq!(
        record.job.error_summary.as_deref(),
        Some("model service unreachable")
    );

    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| e.stage == StageName::Job && e.status == EventStatus::Error));
}

#[tokio::test]
async fn failing_sink_never_blocks_the_pipeline() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    enqueue_good_operation(&client, "Tool wear");

    let analysis_id = create_job(&store, vec![Operation::new("CNC Milling")]).await;
    let report = orchestrator(&store, &client, Arc::new(FailingSink))
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    let stored = store.results(&analysis_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
}

#[tokio::test]
async fn cancellation_stops_before_the_next_operation() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let handle = CancelHandle::new();
    let sink = Arc::new(CancellingSink {
        handle: handle.clone(),
    });

    // Only the first operation's responses exist; the second never runs.
    enqueue_good_operation(&client, "Tool wear");

    let analysis_id = create_job(
        &store,
        vec![Operation::new("CNC Milling"), Operation::new("Anodizing")],
    )
    .await;
    let report = orchestrator(&store, &client, sink)
        .run(&analysis_id, &handle)
        .await
        .unwrap();

    assert_eq!(report.cancelled_at, Some(1));
    assert_eq!(report.results.len(), 1);
    assert_eq!(client.remaining(), 0);

    let record = store.get_job(&analysis_id).await.unwrap();
    assert_eq!(record.job.status, JobStatus::Completed);
    assert_eq!(
        record.job.error_summary.as_deref(),
        Some("cancelled after 1 of 2 operations")
    );
}

// ===========================================================================
// Ordering and concurrency
// ===========================================================================

#[tokio::test]
async fn operations_run_strictly_in_order() {
    let store = Arc::new(MemoryAnalysisStore::new());
    let client = Arc::new(ScriptedModelClient::new());
    let sink = Arc::new(CollectingSink::default());

    enqueue_good_operation(&client, "Porosity in weld");
    enqueue_good_operation(&client, "Paint run");

    let analysis_id = create_job(
        &store,
        vec![Operation::new("Welding"), Operation::new("Painting")],
    )
    .await;
    let report = orchestrator(&store, &client, sink.clone())
        .run(&analysis_id, &CancelHandle::new())
        .await
        .unwrap();
    assert_eq!(report.results.len(), 2);

    let events = sink.events();
    let op_starts: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.stage == StageName::Operation && e.status == EventStatus::Started)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(op_starts.len(), 2);

    let op0_completed = events
        .iter()
        .position(|e| {
            e.stage == StageName::Operation
                && e.status == EventStatus::Completed
                && e.detail["operation_index"] == 0
        })
        .unwrap();
    // Everything for operation 0 finishes before operation 1 starts.
    assert!(op0_completed < op_starts[1]);

    assert_eq!(report.results[0].operation_index, 0);
    assert_eq!(report.results[1].operation_index, 1);
}

#[tokio::test]
async fn concurrent_jobs_stay_isolated() {
    let store = Arc::new(MemoryAnalysisStore::new());

    let client_a = Arc::new(ScriptedModelClient::new());
    enqueue_good_operation(&client_a, "Sand inclusion");
    let client_b = Arc::new(ScriptedModelClient::new());
    enqueue_good_operation(&client_b, "Paint run");

    let id_a = create_job(&store, vec![Operation::new("Casting")]).await;
    let id_b = create_job(&store, vec![Operation::new("Painting")]).await;

    let orch_a = orchestrator(&store, &client_a, Arc::new(NullSink));
    let orch_b = orchestrator(&store, &client_b, Arc::new(NullSink));

    let (report_a, report_b): (
        Result<AnalysisReport, PipelineError>,
        Result<AnalysisReport, PipelineError>,
    ) = futures::future::join(
        orch_a.run(&id_a, &CancelHandle::new()),
        orch_b.run(&id_b, &CancelHandle::new()),
    )
    .await;

    let report_a = report_a.unwrap();
    let report_b = report_b.unwrap();
    assert_eq!(report_a.results.len(), 1);
    assert_eq!(report_b.results.len(), 1);
    assert_eq!(report_a.results[0].process, "Casting");
    assert_eq!(report_b.results[0].process, "Painting");

    let completed = store.list_jobs(Some(JobStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 2);

    let results_a = store.results(&id_a).await.unwrap();
    assert_eq!(results_a.len(), 1);
    assert_eq!(results_a[0].analysis_id, id_a);
}
