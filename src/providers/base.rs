//! Base provider trait and common types for Bard
//!
//! This module defines the Provider trait that inference backends implement,
//! along with the prompt message type, completion responses, and the model
//! descriptors served by `GET /models`.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Message structure sent to the inference runtime
///
/// Represents one entry of the prompt: the system instruction, a prior
/// turn from the history, or the new user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::Message;
    ///
    /// let msg = Message::assistant("Hello, user!");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::Message;
    ///
    /// let msg = Message::system("You are a helpful assistant");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Token usage information from a completion
///
/// Tracks the number of tokens used in prompts and completions,
/// as reported by the AI provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Model descriptor as reported by the inference runtime
///
/// Mirrors one entry of Ollama's `/api/tags` listing. Unknown or missing
/// fields fall back to their defaults so older runtimes still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier used in chat requests (e.g. "gemma3:1b")
    pub name: String,
    /// Model reference as reported by the runtime
    #[serde(default)]
    pub model: String,
    /// Last modification time reported by the runtime
    #[serde(default)]
    pub modified_at: String,
    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,
    /// Content digest
    #[serde(default)]
    pub digest: String,
    /// Runtime-specific details (family, parameter size, quantization)
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ModelInfo {
    /// Create a descriptor with only a name
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::ModelInfo;
    ///
    /// let model = ModelInfo::new("gemma3:1b");
    /// assert_eq!(model.name, "gemma3:1b");
    /// assert_eq!(model.model, "gemma3:1b");
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            model: name.clone(),
            name,
            modified_at: String::new(),
            size: 0,
            digest: String::new(),
            details: serde_json::Value::Null,
        }
    }
}

/// Completion response with the assistant text and optional token usage
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Full assistant text
    pub content: String,
    /// Optional token usage information
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Create a new CompletionResponse without usage data
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::providers::CompletionResponse;
    ///
    /// let response = CompletionResponse::new("Hello!");
    /// assert_eq!(response.content, "Hello!");
    /// assert!(response.usage.is_none());
    /// ```
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    /// Create a new CompletionResponse with token usage
    pub fn with_usage(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage: Some(usage),
        }
    }
}

/// Incremental text fragments produced by a streaming completion
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Provider trait for inference runtimes
///
/// The chat orchestrator, the title generator and the validator only talk
/// to the runtime through this trait, which keeps them testable without a
/// running model server.
///
/// # Examples
///
/// ```no_run
/// use bard::providers::{CompletionResponse, Message, ModelInfo, Provider};
/// use bard::error::Result;
/// use async_trait::async_trait;
///
/// struct EchoProvider;
///
/// #[async_trait]
/// impl Provider for EchoProvider {
///     async fn complete(&self, _model: &str, messages: &[Message]) -> Result<CompletionResponse> {
///         let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
///         Ok(CompletionResponse::new(last))
///     }
///
///     async fn list_models(&self) -> Result<Vec<ModelInfo>> {
///         Ok(vec![ModelInfo::new("echo")])
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run a single-shot completion and return the full assistant text
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or response is invalid
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse>;

    /// Run a streaming completion
    ///
    /// # Default Implementation
    ///
    /// The default implementation performs a single-shot completion and
    /// yields its text as one fragment.
    async fn complete_stream(&self, model: &str, messages: &[Message]) -> Result<CompletionStream> {
        let response = self.complete(model, messages).await?;
        Ok(Box::pin(futures::stream::once(async move {
            Ok(response.content)
        })))
    }

    /// List models currently servable by the runtime
    ///
    /// Implementations must fetch live data; the validator relies on the
    /// result reflecting the runtime's current state.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}
