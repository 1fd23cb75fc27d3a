//! Builder pattern for Orchestrator construction

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::PanelConfig;
use crate::error::{PanelError, PanelResult};
use crate::executor::TaskExecutor;
use crate::prompt::PromptTemplates;
use crate::traits::ResponseClient;

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with proper configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .concurrency(10)
///     .max_agents(50)
///     .client(client)
///     .build()?;
///
/// let outcome = orchestrator.run_from_manifest("A linen shirt", None).await?;
/// ```
pub struct OrchestratorBuilder {
    config: PanelConfig,
    channel_config: ChannelConfig,
    client: Option<Arc<dyn ResponseClient>>,
    templates: Option<PromptTemplates>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: PanelConfig::default(),
            channel_config: ChannelConfig::default(),
            client: None,
            templates: None,
        }
    }

    /// Set the full panel configuration
    pub fn config(mut self, config: PanelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency cap
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the task ceiling
    pub fn max_agents(mut self, max_agents: usize) -> Self {
        self.config.max_agents = max_agents;
        self
    }

    /// Set the response-size ceiling
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the per-call timeout
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Set the processed-content directory
    pub fn processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.processed_dir = dir.into();
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Use explicit templates instead of loading from `template_dir`
    pub fn templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Set the response client
    pub fn client(mut self, client: Arc<dyn ResponseClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if no client is set, if configuration validation
    /// fails, or if templates in `template_dir` cannot be used.
    pub fn build(self) -> PanelResult<Orchestrator> {
        let client = self.client.ok_or(PanelError::MissingConfig("client"))?;

        self.config.validate()?;

        let templates = match (self.templates, &self.config.template_dir) {
            (Some(templates), _) => templates,
            (None, Some(dir)) => PromptTemplates::load_dir(dir)?,
            (None, None) => PromptTemplates::default(),
        };

        let executor = TaskExecutor::new(client, templates)
            .with_max_tokens(self.config.max_tokens)
            .with_call_timeout(self.config.call_timeout);

        Ok(Orchestrator::new(self.config, executor).with_channel_config(self.channel_config))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
