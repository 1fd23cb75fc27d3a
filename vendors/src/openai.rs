//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use crowdtest_core::{ClientError, CompletionRequest, Message, ResponseClient};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{self, HttpConfig};
use crate::traits::VendorConfig;

const CHAT_PATH: &str = "/chat/completions";

/// Client for `POST {base}/chat/completions`
///
/// Works against OpenAI and self-hosted compatible servers; the API key is
/// optional for the latter.
pub struct OpenAIClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
    request_timeout: Duration,
}

impl OpenAIClient {
    /// Create a client from a configuration
    pub fn new(config: &VendorConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: HttpConfig::from_vendor(config).build()?,
            url: format!("{}{CHAT_PATH}", config.base_url()),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Full request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn body<'a>(&'a self, request: &CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages: request.messages(),
        }
    }
}

#[async_trait]
impl ResponseClient for OpenAIClient {
    fn vendor_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClientError> {
        let mut builder = self.client.post(&self.url).json(&self.body(request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let body = http::send(builder, self.request_timeout).await?;
        parse_response(&body)
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a chat completions body
pub fn parse_response(body: &str) -> Result<String, ClientError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("invalid chat response: {e}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::MalformedResponse("response has no choices".into()))?;

    choice
        .message
        .content
        .filter(|text| !text.is_empty())
        .ok_or(ClientError::EmptyResponse)
}
