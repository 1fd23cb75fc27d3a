//! Orchestrator execution logic

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{mpsc, watch};

use crate::channel::ChannelConfig;
use crate::config::PanelConfig;
use crate::error::{ErrorKind, PanelResult};
use crate::executor::TaskExecutor;
use crate::gate::ConcurrencyGate;
use crate::resolver::{ResolvedTask, TaskResolver};
use crate::result::{TaskMetadata, TaskResult};
use crate::sink::CompletionSink;

use super::aggregator::{summarize, BatchOutcome};

/// Lifecycle of the orchestrator's current batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchState {
    /// No batch has been started
    #[default]
    NotStarted,
    /// A batch is executing
    Running,
    /// The last batch returned its outcome
    Completed,
}

/// Orchestrator drives a batch of persona tasks
///
/// Every task is spawned up front; the concurrency gate bounds how many
/// call the response service at once.
pub struct Orchestrator {
    /// Panel configuration
    pub(crate) config: PanelConfig,

    /// Task executor (shared across units)
    pub(crate) executor: Arc<TaskExecutor>,

    /// Concurrency limiter
    pub(crate) gate: ConcurrencyGate,

    /// Completion channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Batch lifecycle publisher
    pub(crate) state_tx: watch::Sender<BatchState>,
}

/// Identity of a submitted unit, kept so a lost unit can still be reported
struct Submitted {
    task_id: String,
    metadata: TaskMetadata,
    notified: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Use `OrchestratorBuilder` for a more ergonomic construction.
    pub fn new(config: PanelConfig, executor: TaskExecutor) -> Self {
        let gate = ConcurrencyGate::new(config.concurrency);
        let (state_tx, _) = watch::channel(BatchState::NotStarted);

        Self {
            config,
            executor: Arc::new(executor),
            gate,
            channel_config: ChannelConfig::default(),
            state_tx,
        }
    }

    /// Replace the completion channel sizing
    pub fn with_channel_config(mut self, channel_config: ChannelConfig) -> Self {
        self.channel_config = channel_config;
        self
    }

    /// Create a completion channel sized by the channel configuration
    ///
    /// Pass the sender as the batch sink; the batch drops notifications
    /// rather than wait when the receiver falls behind.
    pub fn completion_channel(&self) -> (mpsc::Sender<TaskResult>, mpsc::Receiver<TaskResult>) {
        self.channel_config.completion_channel()
    }

    /// Get the panel configuration
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// The concurrency gate
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Current batch state
    pub fn state(&self) -> BatchState {
        *self.state_tx.borrow()
    }

    /// Watch batch state changes
    pub fn subscribe_state(&self) -> watch::Receiver<BatchState> {
        self.state_tx.subscribe()
    }

    /// Stop admitting tasks
    ///
    /// Tasks already holding a slot finish normally; tasks still waiting
    /// become `UnexpectedFailure` results. The gate stays closed for the
    /// life of this orchestrator, so any later batch rejects every task;
    /// build a new orchestrator to run again.
    pub fn shutdown(&self) {
        tracing::info!("Closing concurrency gate");
        self.gate.close();
    }

    /// Resolve the configured processed directory and run every retained task
    ///
    /// Fails only when the manifest cannot be loaded.
    pub async fn run_from_manifest(
        &self,
        product: &str,
        sink: Option<Arc<dyn CompletionSink>>,
    ) -> PanelResult<BatchOutcome> {
        let tasks = TaskResolver::new(&self.config.processed_dir)
            .with_ceiling(self.config.max_agents)
            .resolve()?;

        Ok(self
            .run_batch(product, tasks, Some(self.config.max_agents), sink)
            .await)
    }

    /// Run a batch
    ///
    /// Tasks beyond `ceiling` are dropped before anything runs. The returned
    /// results are in submission order; `sink` sees them in completion order.
    pub async fn run_batch(
        &self,
        product: &str,
        mut tasks: Vec<ResolvedTask>,
        ceiling: Option<usize>,
        sink: Option<Arc<dyn CompletionSink>>,
    ) -> BatchOutcome {
        if let Some(limit) = ceiling {
            tasks.truncate(limit);
        }

        if self.gate.is_closed() {
            tracing::warn!(
                tasks = tasks.len(),
                "Concurrency gate is closed, every task will be rejected"
            );
        }

        self.state_tx.send_replace(BatchState::Running);
        let start = Instant::now();

        tracing::info!(
            tasks = tasks.len(),
            concurrency = self.gate.capacity(),
            vendor = self.executor.client().vendor_name(),
            model = self.executor.client().model_name(),
            "Starting batch"
        );

        let product: Arc<str> = Arc::from(product);
        let mut submitted = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let notified = Arc::new(AtomicBool::new(false));
            submitted.push(Submitted {
                task_id: task.task_id().to_string(),
                metadata: task.metadata().clone(),
                notified: Arc::clone(&notified),
            });

            let executor = Arc::clone(&self.executor);
            let gate = self.gate.clone();
            let product = Arc::clone(&product);
            let sink = sink.clone();

            handles.push(tokio::spawn(async move {
                let result = run_unit(&executor, &gate, task, &product).await;

                notified.store(true, Ordering::SeqCst);
                if let Some(sink) = sink {
                    notify(sink.as_ref(), &result).await;
                }
                result
            }));
        }

        let joined = futures::future::join_all(handles).await;

        let mut results = Vec::with_capacity(joined.len());
        for (unit, outcome) in submitted.into_iter().zip(joined) {
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(
                        task_id = %unit.task_id,
                        error_kind = %ErrorKind::UnexpectedFailure,
                        error = %e,
                        "Task unit panicked or was cancelled"
                    );
                    let result = TaskResult::failure(
                        &unit.task_id,
                        &unit.metadata,
                        ErrorKind::UnexpectedFailure,
                        Duration::ZERO,
                    );
                    if !unit.notified.load(Ordering::SeqCst) {
                        if let Some(sink) = &sink {
                            notify(sink.as_ref(), &result).await;
                        }
                    }
                    result
                }
            };
            results.push(result);
        }

        let summary = summarize(&results, start.elapsed());
        tracing::info!(
            total = summary.total,
            failures = summary.failures,
            elapsed_secs = summary.duration.as_secs_f64(),
            avg_ms_per_task = summary.wall_ms_per_task(),
            "Batch completed"
        );

        self.state_tx.send_replace(BatchState::Completed);
        BatchOutcome { results, summary }
    }

    /// Run a batch, closing the gate on Ctrl+C
    pub async fn run_with_signal_handling(
        &self,
        product: &str,
        tasks: Vec<ResolvedTask>,
        ceiling: Option<usize>,
        sink: Option<Arc<dyn CompletionSink>>,
    ) -> BatchOutcome {
        let gate = self.gate.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, no further tasks will be admitted");
                    gate.close();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let outcome = self.run_batch(product, tasks, ceiling, sink).await;

        signal_handle.abort();

        outcome
    }
}

/// Deliver a result to the sink; a panicking sink loses only its own
/// notification, never the result
async fn notify(sink: &dyn CompletionSink, result: &TaskResult) {
    if let Err(panic) = AssertUnwindSafe(sink.on_complete(result))
        .catch_unwind()
        .await
    {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::error!(
            task_id = %result.task_id,
            panic = %message,
            "Completion sink panicked"
        );
    }
}

/// Body of one spawned unit
async fn run_unit(
    executor: &TaskExecutor,
    gate: &ConcurrencyGate,
    task: ResolvedTask,
    product: &str,
) -> TaskResult {
    let input = match task {
        ResolvedTask::Ready(input) => input,
        ResolvedTask::Missing {
            task_id, metadata, ..
        } => {
            return TaskResult::failure(
                &task_id,
                &metadata,
                ErrorKind::ContentMissing,
                Duration::ZERO,
            );
        }
    };

    let permit = match gate.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            tracing::warn!(task_id = %input.task_id, error = %e, "Task not admitted");
            return TaskResult::failure(
                &input.task_id,
                &input.metadata,
                e.kind(),
                Duration::ZERO,
            );
        }
    };

    let result = executor.execute(&input, product).await;
    drop(permit);
    result
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .field("state", &self.state())
            .finish()
    }
}
