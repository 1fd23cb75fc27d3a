//! Tests for the Orchestrator module

use super::aggregator::summarize;
use super::builder::OrchestratorBuilder;
use super::executor::{BatchState, Orchestrator};
use crate::channel::ChannelConfig;
use crate::error::{ErrorKind, PanelError};
use crate::request::CompletionRequest;
use crate::resolver::ResolvedTask;
use crate::result::{TaskInput, TaskMetadata, TaskResult};
use crate::sentiment::Sentiment;
use crate::sink::{sink_fn, CompletionSink};
use crate::traits::{ClientError, ResponseClient};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock ResponseClient
// ============================================================================

/// Persona text containing this fails with a server error
const FAIL: &str = "[fail]";
/// Persona text containing this panics inside the client
const PANIC: &str = "[panic]";
/// Persona text containing this is answered slowly
const SLOW: &str = "[slow]";

struct MockResponseClient {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockResponseClient {
    fn new() -> Self {
        Self {
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ResponseClient for MockResponseClient {
    fn vendor_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if request.system.contains(PANIC) {
            panic!("simulated client panic");
        }

        let delay = if request.system.contains(SLOW) {
            self.delay * 10
        } else {
            self.delay
        };
        tokio::time::sleep(delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.system.contains(FAIL) {
            return Err(ClientError::ServerError {
                status: 500,
                message: "Simulated failure".to_string(),
            });
        }

        Ok("I love this, would definitely buy it.".to_string())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn task(id: &str, persona: &str) -> ResolvedTask {
    ResolvedTask::Ready(TaskInput::new(
        id,
        format!("You are customer {id}. {persona}"),
        TaskMetadata {
            display_name: Some(format!("Customer {id}")),
            age: Some(30),
            segments: vec!["loyal".into()],
        },
    ))
}

fn tasks(n: usize) -> Vec<ResolvedTask> {
    (0..n).map(|i| task(&format!("t{i}"), "")).collect()
}

fn orchestrator(client: Arc<MockResponseClient>, concurrency: usize) -> Orchestrator {
    OrchestratorBuilder::new()
        .concurrency(concurrency)
        .client(client)
        .build()
        .unwrap()
}

/// Sink recording task ids in completion order
fn recording_sink() -> (Arc<dyn CompletionSink>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let sink = sink_fn(move |result: &TaskResult| {
        log.lock().unwrap().push(result.task_id.clone());
    });
    (sink, seen)
}

fn ids(results: &[TaskResult]) -> Vec<&str> {
    results.iter().map(|r| r.task_id.as_str()).collect()
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_requires_client() {
    let err = OrchestratorBuilder::new().build().unwrap_err();
    assert!(matches!(err, PanelError::MissingConfig("client")));
}

#[test]
fn test_builder_validates_config() {
    let err = OrchestratorBuilder::new()
        .concurrency(0)
        .client(Arc::new(MockResponseClient::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, PanelError::Config(_)));
}

#[test]
fn test_builder_applies_concurrency() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 7);
    assert_eq!(orch.gate().capacity(), 7);
    assert_eq!(orch.state(), BatchState::NotStarted);
}

// ============================================================================
// Batch execution
// ============================================================================

#[tokio::test]
async fn test_empty_batch() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 2);
    let outcome = orch.run_batch("shirt", Vec::new(), None, None).await;

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.summary.total, 0);
    assert_eq!(outcome.summary.success_rate(), 0.0);
    assert_eq!(orch.state(), BatchState::Completed);
}

#[tokio::test]
async fn test_results_in_submission_order() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(client, 4);
    let (sink, seen) = recording_sink();

    let batch = vec![
        task("slow-a", SLOW),
        task("fast-b", ""),
        task("slow-c", SLOW),
        task("fast-d", ""),
    ];
    let outcome = orch.run_batch("shirt", batch, None, Some(sink)).await;

    assert_eq!(ids(&outcome.results), vec!["slow-a", "fast-b", "slow-c", "fast-d"]);

    // callbacks follow completion order, so the fast tasks come first
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(seen[..2].iter().all(|id| id.starts_with("fast")));
}

#[tokio::test]
async fn test_gate_bounds_in_flight() {
    let client = Arc::new(MockResponseClient::new().with_delay(Duration::from_millis(10)));
    let orch = orchestrator(Arc::clone(&client), 3);

    let outcome = orch.run_batch("shirt", tasks(20), None, None).await;

    assert_eq!(outcome.results.len(), 20);
    assert_eq!(client.calls.load(Ordering::SeqCst), 20);
    let peak = client.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight {peak} exceeded the cap");
    assert!(peak > 1, "tasks never overlapped");
    assert_eq!(orch.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_single_slot_serializes() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(Arc::clone(&client), 1);

    orch.run_batch("shirt", tasks(5), None, None).await;

    assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ceiling_cuts_prefix() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(Arc::clone(&client), 2);

    let outcome = orch.run_batch("shirt", tasks(5), Some(3), None).await;

    assert_eq!(ids(&outcome.results), vec!["t0", "t1", "t2"]);
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_callback_for_every_task() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 3);
    let (sink, seen) = recording_sink();

    let outcome = orch.run_batch("shirt", tasks(10), None, Some(sink)).await;

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    let mut returned: Vec<_> = ids(&outcome.results).into_iter().map(String::from).collect();
    returned.sort();
    assert_eq!(seen, returned);
}

#[tokio::test]
async fn test_channel_sink_receives_all() {
    let orch = OrchestratorBuilder::new()
        .concurrency(2)
        .channel_config(ChannelConfig::default().with_completion_buffer(8))
        .client(Arc::new(MockResponseClient::new()))
        .build()
        .unwrap();
    let (tx, mut rx) = orch.completion_channel();
    assert_eq!(tx.max_capacity(), 8);

    let sink: Arc<dyn CompletionSink> = Arc::new(tx);
    let outcome = orch.run_batch("shirt", tasks(4), None, Some(sink)).await;

    let mut received = Vec::new();
    while let Some(result) = rx.recv().await {
        received.push(result);
    }
    assert_eq!(received.len(), 4);
    assert_eq!(outcome.results.len(), 4);
}

#[tokio::test]
async fn test_undrained_channel_smaller_than_batch() {
    let orch = OrchestratorBuilder::new()
        .concurrency(2)
        .channel_config(ChannelConfig::default().with_completion_buffer(1))
        .client(Arc::new(MockResponseClient::new()))
        .build()
        .unwrap();
    let (tx, mut rx) = orch.completion_channel();

    let sink: Arc<dyn CompletionSink> = Arc::new(tx);
    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        orch.run_batch("shirt", tasks(3), None, Some(sink)),
    )
    .await
    .expect("batch must finish while nobody drains the channel");

    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.results.iter().all(|r| !r.is_error()));

    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 1);
}

#[tokio::test]
async fn test_sink_panic_keeps_result() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 2);
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&delivered);
    let sink = sink_fn(move |result: &TaskResult| {
        log.lock().unwrap().push(result.task_id.clone());
        if result.task_id == "b" {
            panic!("sink failure");
        }
    });

    let outcome = orch
        .run_batch("shirt", vec![task("a", ""), task("b", "")], None, Some(sink))
        .await;

    assert_eq!(ids(&outcome.results), vec!["a", "b"]);
    let kept = &outcome.results[1];
    assert!(!kept.is_error());
    assert_eq!(kept.response_text, "I love this, would definitely buy it.");
    assert_eq!(kept.sentiment, Sentiment::Positive);
    assert_eq!(outcome.summary.failures, 0);

    let mut delivered = delivered.lock().unwrap().clone();
    delivered.sort();
    assert_eq!(delivered, vec!["a", "b"]);
    assert_eq!(orch.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_call_failure_isolated() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 2);

    let batch = vec![task("a", ""), task("b", FAIL), task("c", "")];
    let outcome = orch.run_batch("shirt", batch, None, None).await;

    let failed = &outcome.results[1];
    assert_eq!(failed.response_text, "[Error: CallFailed]");
    assert_eq!(failed.sentiment, Sentiment::Neutral);
    assert_eq!(failed.display_name, "Customer b");
    assert!(!outcome.results[0].is_error());
    assert!(!outcome.results[2].is_error());
    assert_eq!(outcome.summary.failures, 1);
}

#[tokio::test]
async fn test_missing_content_becomes_result() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(Arc::clone(&client), 2);
    let (sink, seen) = recording_sink();

    let batch = vec![
        task("a", ""),
        ResolvedTask::Missing {
            task_id: "gone".into(),
            metadata: TaskMetadata {
                display_name: None,
                age: Some(52),
                segments: vec!["lapsed".into()],
            },
            reason: "gone.txt: not found".into(),
        },
    ];
    let outcome = orch.run_batch("shirt", batch, None, Some(sink)).await;

    let missing = &outcome.results[1];
    assert_eq!(missing.response_text, "[Error: ContentMissing]");
    assert_eq!(missing.age, 52);
    assert_eq!(missing.segment, "lapsed");
    assert_eq!(missing.response_time_ms, 0.0);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_panic_becomes_unexpected_failure() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 2);
    let (sink, seen) = recording_sink();

    let batch = vec![task("a", ""), task("boom", PANIC), task("c", "")];
    let outcome = orch.run_batch("shirt", batch, None, Some(sink)).await;

    assert_eq!(ids(&outcome.results), vec!["a", "boom", "c"]);
    let lost = &outcome.results[1];
    assert_eq!(lost.error_kind(), Some(ErrorKind::UnexpectedFailure));
    assert_eq!(lost.display_name, "Customer boom");
    assert_eq!(lost.response_time_ms, 0.0);
    assert_eq!(lost.sentiment, Sentiment::Neutral);

    // the lost unit is still reported exactly once
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen.iter().filter(|id| *id == "boom").count(), 1);

    // a panicking unit must not leak its gate slot
    assert_eq!(orch.gate().in_flight(), 0);
}

#[tokio::test]
async fn test_shutdown_rejects_waiting_tasks() {
    let client = Arc::new(MockResponseClient::new().with_delay(Duration::from_millis(50)));
    let orch = orchestrator(Arc::clone(&client), 1);

    let (outcome, ()) = tokio::join!(orch.run_batch("shirt", tasks(3), None, None), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        orch.shutdown();
    });

    assert_eq!(outcome.results.len(), 3);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    let rejected = outcome
        .results
        .iter()
        .filter(|r| r.error_kind() == Some(ErrorKind::UnexpectedFailure))
        .count();
    assert_eq!(rejected, 2);
}

#[tokio::test]
async fn test_shutdown_is_permanent() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(Arc::clone(&client), 2);

    orch.shutdown();
    assert!(orch.gate().is_closed());

    let outcome = orch.run_batch("shirt", tasks(2), None, None).await;
    assert_eq!(outcome.summary.failures, 2);
    assert!(outcome
        .results
        .iter()
        .all(|r| r.error_kind() == Some(ErrorKind::UnexpectedFailure)));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.state(), BatchState::Completed);
}

#[tokio::test]
async fn test_state_transitions() {
    let orch = orchestrator(Arc::new(MockResponseClient::new()), 2);
    let states = Arc::new(Mutex::new(Vec::new()));

    let rx = orch.subscribe_state();
    let log = Arc::clone(&states);
    let sink = sink_fn(move |_| log.lock().unwrap().push(*rx.borrow()));

    assert_eq!(orch.state(), BatchState::NotStarted);
    orch.run_batch("shirt", tasks(3), None, Some(sink)).await;
    assert_eq!(orch.state(), BatchState::Completed);

    assert!(states
        .lock()
        .unwrap()
        .iter()
        .all(|s| *s == BatchState::Running));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_five_tasks_one_failure() {
    let client = Arc::new(MockResponseClient::new());
    let orch = orchestrator(Arc::clone(&client), 2);
    let (sink, seen) = recording_sink();

    let batch = vec![
        task("p1", ""),
        task("p2", ""),
        task("p3", FAIL),
        task("p4", ""),
        task("p5", ""),
    ];
    let outcome = orch.run_batch("A linen shirt", batch, Some(5), Some(sink)).await;

    assert_eq!(ids(&outcome.results), vec!["p1", "p2", "p3", "p4", "p5"]);
    let clean: Vec<_> = outcome.results.iter().filter(|r| !r.is_error()).collect();
    assert_eq!(clean.len(), 4);
    assert!(clean.iter().all(|r| r.sentiment == Sentiment::Positive));
    assert_eq!(outcome.results[2].response_text, "[Error: CallFailed]");
    assert!(outcome.results.iter().all(|r| r.response_time_ms >= 0.0));
    assert_eq!(seen.lock().unwrap().len(), 5);
    assert!(client.max_in_flight.load(Ordering::SeqCst) <= 2);

    assert_eq!(outcome.summary.total, 5);
    assert_eq!(outcome.summary.failures, 1);
    assert_eq!(outcome.summary.succeeded(), 4);
}

#[tokio::test]
async fn test_run_from_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "You are Ana.").unwrap();
    std::fs::write(dir.path().join("b.txt"), "You are Rui.").unwrap();
    std::fs::write(
        dir.path().join("manifest.json"),
        r#"{"a": {"persona_file": "a.txt", "display_name": "Ana"},
            "missing": {"persona_file": "nope.txt"},
            "b": {"persona_file": "b.txt"}}"#,
    )
    .unwrap();

    let orch = OrchestratorBuilder::new()
        .processed_dir(dir.path())
        .max_agents(2)
        .client(Arc::new(MockResponseClient::new()))
        .build()
        .unwrap();

    let outcome = orch.run_from_manifest("shirt", None).await.unwrap();

    assert_eq!(ids(&outcome.results), vec!["a", "missing"]);
    assert_eq!(outcome.results[0].display_name, "Ana");
    assert_eq!(
        outcome.results[1].error_kind(),
        Some(ErrorKind::ContentMissing)
    );
}

#[tokio::test]
async fn test_run_from_manifest_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let orch = OrchestratorBuilder::new()
        .processed_dir(dir.path().join("absent"))
        .client(Arc::new(MockResponseClient::new()))
        .build()
        .unwrap();

    let err = orch.run_from_manifest("shirt", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ManifestNotFound);
    assert_eq!(orch.state(), BatchState::NotStarted);
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_summarize() {
    let meta = TaskMetadata::default();
    let results = vec![
        TaskResult::success("a", &meta, "great", Duration::from_millis(100)),
        TaskResult::success("b", &meta, "meh", Duration::from_millis(300)),
        TaskResult::failure("c", &meta, ErrorKind::CallFailed, Duration::from_millis(200)),
        TaskResult::failure("d", &meta, ErrorKind::ContentMissing, Duration::ZERO),
    ];

    let summary = summarize(&results, Duration::from_secs(2));

    assert_eq!(summary.total, 4);
    assert_eq!(summary.failures, 2);
    assert_eq!(summary.succeeded(), 2);
    assert!((summary.success_rate() - 0.5).abs() < f64::EPSILON);
    assert!((summary.failure_rate() - 0.5).abs() < f64::EPSILON);
    assert!((summary.mean_response_ms - 150.0).abs() < 1e-9);
    assert!((summary.wall_ms_per_task() - 500.0).abs() < 1e-9);
}

#[test]
fn test_summarize_empty() {
    let summary = summarize(&[], Duration::ZERO);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.failure_rate(), 0.0);
    assert_eq!(summary.wall_ms_per_task(), 0.0);
}
