//! Single-task execution
//!
//! [`TaskExecutor::execute`] never fails: every error is turned into an
//! error-marked [`TaskResult`] so one bad response cannot abort a batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_MAX_TOKENS;
use crate::prompt::PromptTemplates;
use crate::request::CompletionRequest;
use crate::result::{TaskInput, TaskResult};
use crate::traits::{ClientError, ResponseClient};

/// Runs one persona evaluation against the response service
pub struct TaskExecutor {
    client: Arc<dyn ResponseClient>,
    templates: PromptTemplates,
    max_tokens: u32,
    call_timeout: Option<Duration>,
}

impl TaskExecutor {
    /// Create an executor with default response size and no extra timeout
    pub fn new(client: Arc<dyn ResponseClient>, templates: PromptTemplates) -> Self {
        Self {
            client,
            templates,
            max_tokens: DEFAULT_MAX_TOKENS,
            call_timeout: None,
        }
    }

    /// Set the response-size ceiling
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bound each call; an expired call becomes a `CallFailed` result
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Prompt templates in use
    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// The underlying client
    pub fn client(&self) -> &Arc<dyn ResponseClient> {
        &self.client
    }

    /// Build the request for one task
    pub fn build_request(&self, input: &TaskInput, product: &str) -> CompletionRequest {
        CompletionRequest::new(
            self.templates.format_agent_prompt(&input.persona),
            self.templates.format_evaluation_prompt(product),
            self.max_tokens,
        )
    }

    /// Execute one task
    pub async fn execute(&self, input: &TaskInput, product: &str) -> TaskResult {
        let request = self.build_request(input, product);

        let start = Instant::now();
        let outcome = self.call(&request).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(text) => {
                tracing::debug!(
                    task_id = %input.task_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Task completed"
                );
                TaskResult::success(&input.task_id, &input.metadata, text, elapsed)
            }
            Err(e) => {
                let kind = e.to_error_kind();
                tracing::error!(
                    task_id = %input.task_id,
                    error_kind = %kind,
                    error = %e,
                    "Task failed"
                );
                TaskResult::failure(&input.task_id, &input.metadata, kind, elapsed)
            }
        }
    }

    async fn call(&self, request: &CompletionRequest) -> Result<String, ClientError> {
        let text = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.complete(request))
                .await
                .map_err(|_| ClientError::Timeout(limit))??,
            None => self.client.complete(request).await?,
        };

        if text.trim().is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        Ok(text)
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("vendor", &self.client.vendor_name())
            .field("model", &self.client.model_name())
            .field("max_tokens", &self.max_tokens)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
