//! Panel run configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of tasks allowed to call the response service at once
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Default number of manifest entries taken into a batch
pub const DEFAULT_MAX_AGENTS: usize = 200;

/// Default response-size ceiling passed to the response service
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Default directory holding `manifest.json` and the persona files
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";

/// Panel run configuration
///
/// The task ceiling (`max_agents`) and the concurrency cap are independent:
/// nothing requires one to be smaller than the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Maximum number of tasks holding a gate slot at any instant
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Prefix cut applied to the manifest before execution
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Response-size ceiling for each call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional per-call timeout enforced on top of the client's own
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub call_timeout: Option<Duration>,

    /// Directory containing the manifest and persona files
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Directory with `agent_persona.txt` / `agent_evaluation.txt` overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_max_agents() -> usize {
    DEFAULT_MAX_AGENTS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PROCESSED_DIR)
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_agents: DEFAULT_MAX_AGENTS,
            max_tokens: DEFAULT_MAX_TOKENS,
            call_timeout: None,
            processed_dir: default_processed_dir(),
            template_dir: None,
        }
    }
}

impl PanelConfig {
    /// Create a new config with the given concurrency
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    /// Set the task ceiling
    pub fn with_max_agents(mut self, max_agents: usize) -> Self {
        self.max_agents = max_agents;
        self
    }

    /// Set the response-size ceiling
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set an explicit per-call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the processed-content directory
    pub fn with_processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.processed_dir = dir.into();
        self
    }

    /// Set the prompt template directory
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.max_agents == 0 {
            return Err(ConfigError::InvalidCeiling(
                "max_agents must be at least 1".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(
                "max_tokens must be at least 1".into(),
            ));
        }

        if let Some(timeout) = self.call_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(
                    "call timeout must be non-zero".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid task ceiling
    #[error("Invalid task ceiling: {0}")]
    InvalidCeiling(String),

    /// Invalid response-size ceiling
    #[error("Invalid max tokens: {0}")]
    InvalidMaxTokens(String),

    /// Invalid call timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}
