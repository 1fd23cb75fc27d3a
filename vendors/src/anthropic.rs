//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use crowdtest_core::{ClientError, CompletionRequest, ResponseClient};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{self, HttpConfig};
use crate::traits::VendorConfig;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for `POST /v1/messages`
pub struct AnthropicClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    request_timeout: Duration,
}

impl AnthropicClient {
    /// Create a client from a validated configuration
    pub fn new(config: &VendorConfig) -> Result<Self, ClientError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClientError::Config("Anthropic API key is not set".into()))?;

        Ok(Self {
            client: HttpConfig::from_vendor(config).build()?,
            url: format!("{}{MESSAGES_PATH}", config.base_url()),
            api_key,
            model: config.model.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Full request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [UserMessage {
                role: "user",
                content: &request.user,
            }],
        }
    }
}

#[async_trait]
impl ResponseClient for AnthropicClient {
    fn vendor_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError> {
        let builder = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(request));

        let body = http::send(builder, self.request_timeout).await?;
        parse_response(&body)
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Extract the first text block from a Messages API response body
pub fn parse_response(body: &str) -> Result<String, ClientError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid Messages response: {e}")))?;

    parsed
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or(ClientError::EmptyResponse)
}
