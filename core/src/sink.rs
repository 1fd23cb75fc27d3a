//! Completion notification
//!
//! The orchestrator calls a [`CompletionSink`] once per finished task, in
//! completion order, after the task has released its gate slot. A sink must
//! not wait on its consumer: the channel sinks below drop a notification
//! rather than block the batch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::result::TaskResult;

/// Observer of finished tasks
#[async_trait]
pub trait CompletionSink: Send + Sync {
    /// Called once for every finished task
    async fn on_complete(&self, result: &TaskResult);
}

/// Sink backed by a synchronous closure
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(&TaskResult) + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> CompletionSink for FnSink<F>
where
    F: Fn(&TaskResult) + Send + Sync,
{
    async fn on_complete(&self, result: &TaskResult) {
        (self.f)(result);
    }
}

/// Shared sink from a closure
pub fn sink_fn<F>(f: F) -> Arc<dyn CompletionSink>
where
    F: Fn(&TaskResult) + Send + Sync + 'static,
{
    Arc::new(FnSink::new(f))
}

#[async_trait]
impl CompletionSink for mpsc::Sender<TaskResult> {
    async fn on_complete(&self, result: &TaskResult) {
        match self.try_send(result.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    task_id = %result.task_id,
                    capacity = self.max_capacity(),
                    "Completion channel full, dropping notification"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    task_id = %result.task_id,
                    "Completion channel closed, dropping notification"
                );
            }
        }
    }
}

#[async_trait]
impl CompletionSink for mpsc::UnboundedSender<TaskResult> {
    async fn on_complete(&self, result: &TaskResult) {
        if self.send(result.clone()).is_err() {
            tracing::debug!(
                task_id = %result.task_id,
                "Completion channel closed, dropping notification"
            );
        }
    }
}
