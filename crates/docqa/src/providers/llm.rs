//! Chat model provider trait

use async_trait::async_trait;
use futures_util::{stream::BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Stream of content fragments from a chat model
///
/// An `Err` item means the upstream stream broke; no items follow it.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for chat-based answer generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (llama3.2, mistral, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Open a streamed completion for the given conversation
    async fn chat_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream>;

    /// Complete a conversation and return the whole reply
    ///
    /// Default implementation collects `chat_stream`.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let mut stream = self.chat_stream(messages).await?;
        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            reply.push_str(&fragment?);
        }
        Ok(reply)
    }

    /// Chat models available upstream
    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec![self.model().to_string()])
    }

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
