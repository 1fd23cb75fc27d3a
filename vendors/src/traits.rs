//! Vendor types and configuration
//!
//! This module provides vendor enumeration and client configuration.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Accepted request timeouts
const REQUEST_TIMEOUT_RANGE: RangeInclusive<Duration> =
    Duration::from_secs(1)..=Duration::from_secs(3600);

/// Accepted connect timeouts
const CONNECT_TIMEOUT_RANGE: RangeInclusive<Duration> =
    Duration::from_secs(1)..=Duration::from_secs(300);

/// Rejected vendor configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Field left empty or unset
    #[error("vendor config field `{0}` is required")]
    MissingField(&'static str),

    /// Request or connect timeout outside its accepted range
    #[error("{field} of {value:?} is out of range")]
    InvalidTimeout {
        /// Which timeout
        field: &'static str,
        /// Rejected value
        value: Duration,
    },
}

// ============================================================================
// Vendor Enumeration
// ============================================================================

/// Enumeration of supported response services.
///
/// Used for configuration parsing and client factory dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    /// Anthropic Messages API
    #[default]
    #[serde(rename = "anthropic")]
    Anthropic,
    /// OpenAI chat completions API (also vLLM, SGLang, etc.)
    #[serde(rename = "openai")]
    OpenAI,
}

impl Vendor {
    /// Returns the display name for this vendor.
    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::Anthropic => "Anthropic",
            Vendor::OpenAI => "OpenAI",
        }
    }

    /// Returns the identifier string for this vendor.
    pub fn id(&self) -> &'static str {
        match self {
            Vendor::Anthropic => "anthropic",
            Vendor::OpenAI => "openai",
        }
    }

    /// Base URL used when no endpoint is configured.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Vendor::Anthropic => "https://api.anthropic.com",
            Vendor::OpenAI => "https://api.openai.com/v1",
        }
    }

    /// Environment variable holding this vendor's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Vendor::Anthropic => "ANTHROPIC_API_KEY",
            Vendor::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Whether calls need an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Vendor::Anthropic)
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Vendor::Anthropic),
            "openai" | "openai-compatible" => Ok(Vendor::OpenAI),
            _ => Err(format!("Unknown vendor: {}", s)),
        }
    }
}

// ============================================================================
// Vendor Configuration
// ============================================================================

/// Configuration for creating a response client.
#[derive(Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Target vendor
    #[serde(default)]
    pub vendor: Vendor,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL, overriding the vendor default
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key; never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

impl VendorConfig {
    /// Create a new vendor config with required fields.
    pub fn new(vendor: Vendor, model: impl Into<String>) -> Self {
        Self {
            vendor,
            model: model.into(),
            endpoint: None,
            api_key: None,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.vendor.default_endpoint())
            .trim_end_matches('/')
    }

    /// Check the model, both timeouts, and the API key when the vendor needs one
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.is_empty() {
            return Err(ConfigValidationError::MissingField("model"));
        }

        for (field, value, range) in [
            ("request_timeout", self.request_timeout, REQUEST_TIMEOUT_RANGE),
            ("connect_timeout", self.connect_timeout, CONNECT_TIMEOUT_RANGE),
        ] {
            if !range.contains(&value) {
                return Err(ConfigValidationError::InvalidTimeout { field, value });
            }
        }

        if self.vendor.requires_api_key() && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigValidationError::MissingField("api_key"));
        }

        Ok(())
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self::new(Vendor::Anthropic, DEFAULT_MODEL)
    }
}

impl std::fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorConfig")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
