//! Response-service client implementations
//!
//! This crate provides implementations of the `ResponseClient` trait for:
//!
//! - Anthropic Messages API
//! - OpenAI-compatible chat completions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anthropic;
pub mod http;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crowdtest_core::{ClientError, ResponseClient};

pub use anthropic::AnthropicClient;
pub use openai::OpenAIClient;
pub use traits::{ConfigValidationError, Vendor, VendorConfig, DEFAULT_MODEL};

/// Create a client for the configured vendor
///
/// # Errors
///
/// Returns [`ClientError::Config`] when the configuration is invalid or the
/// HTTP client cannot be built.
pub fn create_client(config: &VendorConfig) -> Result<Arc<dyn ResponseClient>, ClientError> {
    config
        .validate()
        .map_err(|e| ClientError::Config(e.to_string()))?;

    tracing::debug!(
        vendor = config.vendor.id(),
        model = %config.model,
        endpoint = config.base_url(),
        "Creating response client"
    );

    let client: Arc<dyn ResponseClient> = match config.vendor {
        Vendor::Anthropic => Arc::new(AnthropicClient::new(config)?),
        Vendor::OpenAI => Arc::new(OpenAIClient::new(config)?),
    };
    Ok(client)
}
