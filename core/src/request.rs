//! Request types sent to the response service

use serde::{Deserialize, Serialize};

/// A single two-part completion request: persona instructions plus the
/// evaluation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction (persona wrapped in agent-role instructions)
    pub system: String,

    /// User message (evaluation instructions plus product description)
    pub user: String,

    /// Response-size ceiling
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new request
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
        }
    }

    /// The conversation turns for vendors that take the system prompt
    /// as a message rather than a top-level field
    pub fn messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

/// Chat message (OpenAI-compatible format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message role (system, user, assistant)
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a new text message
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions)
    System,
    /// User message (input)
    User,
    /// Assistant message (output)
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}
