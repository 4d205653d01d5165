//! Chat model trait used to generate answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message of a chat-completion prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Instructions framing the conversation.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// A message from the person asking.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A chat-completion backend.
///
/// One call is one non-streaming round-trip; implementations do not retry.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier used for logging.
    fn name(&self) -> &str;

    /// Generate a reply to the given messages.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
