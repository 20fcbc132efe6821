//! Ollama provider implementation for Bard
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server for single-shot and streaming chat completions and
//! for the live model catalog.

use crate::config::OllamaConfig;
use crate::error::{BardError, Result};
use crate::providers::{
    CompletionResponse, CompletionStream, Message, ModelInfo, Provider, TokenUsage,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Capacity of the channel between the NDJSON decoder and the consumer
const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Ollama API provider
///
/// Talks to `/api/chat` for completions and `/api/tags` for the model
/// catalog. The catalog is never cached: every `list_models` call hits the
/// runtime so validation sees models pulled or removed since the last
/// request.
///
/// # Examples
///
/// ```no_run
/// use bard::config::OllamaConfig;
/// use bard::providers::{Message, OllamaProvider, Provider};
///
/// # async fn example() -> bard::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let completion = provider
///     .complete("gemma3:1b", &[Message::user("Hello!")])
///     .await?;
/// println!("{}", completion.content);
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Response from Ollama's /api/tags endpoint
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Request structure for Ollama's /api/chat endpoint
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Message structure in Ollama responses
#[derive(Debug, Default, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Response structure from a non-streaming /api/chat call
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

/// One line of a streaming /api/chat response
#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::config::OllamaConfig;
    /// use bard::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        // No overall timeout: completions may legitimately run for minutes
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(concat!("bard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BardError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Ollama provider: host={}", config.host);

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::config::OllamaConfig;
    /// use bard::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default()).unwrap();
    /// assert_eq!(provider.host(), "http://localhost:11434");
    /// ```
    pub fn host(&self) -> &str {
        &self.config.host
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn post_chat(&self, model: &str, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let request = OllamaRequest {
            model,
            messages,
            stream,
        };

        tracing::debug!(
            "Sending Ollama request: model={}, {} messages, stream={}",
            model,
            messages.len(),
            stream
        );

        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                BardError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(BardError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(response)
    }
}

/// Decode a newline-delimited JSON chat stream into text fragments.
///
/// Bytes are buffered until a full line is available, so chunk boundaries
/// that split a line (or a multi-byte character) are handled. Decoding stops
/// at the first `done: true` line. A stream that ends before `done`, an
/// `error` line, or an unparseable line is forwarded as an error.
pub(crate) async fn parse_ndjson_stream<S>(byte_stream: S, tx: mpsc::Sender<Result<String>>)
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let mut buffer: Vec<u8> = Vec::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx
                    .send(Err(BardError::Provider(format!("Ollama stream failed: {}", e)).into()))
                    .await;
                return;
            }
        };

        buffer.extend_from_slice(&chunk);

        while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            match process_ndjson_line(&line) {
                LineOutcome::Skip => {}
                LineOutcome::Fragment(text) => {
                    if tx.send(Ok(text)).await.is_err() {
                        return;
                    }
                }
                LineOutcome::Done(text) => {
                    if let Some(text) = text {
                        let _ = tx.send(Ok(text)).await;
                    }
                    return;
                }
                LineOutcome::Failed(message) => {
                    let _ = tx.send(Err(BardError::Provider(message).into())).await;
                    return;
                }
            }
        }
    }

    // A trailing line without a newline terminator
    match process_ndjson_line(&buffer) {
        LineOutcome::Done(text) => {
            if let Some(text) = text {
                let _ = tx.send(Ok(text)).await;
            }
        }
        LineOutcome::Failed(message) => {
            let _ = tx.send(Err(BardError::Provider(message).into())).await;
        }
        LineOutcome::Skip | LineOutcome::Fragment(_) => {
            let _ = tx
                .send(Err(BardError::Provider(
                    "Ollama stream ended before completion".to_string(),
                )
                .into()))
                .await;
        }
    }
}

enum LineOutcome {
    Skip,
    Fragment(String),
    Done(Option<String>),
    Failed(String),
}

fn process_ndjson_line(line: &[u8]) -> LineOutcome {
    let text = match std::str::from_utf8(line) {
        Ok(t) => t.trim(),
        Err(e) => return LineOutcome::Failed(format!("Invalid UTF-8 in Ollama stream: {}", e)),
    };

    if text.is_empty() {
        return LineOutcome::Skip;
    }

    let chunk: OllamaStreamChunk = match serde_json::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to parse Ollama stream line: {}", e);
            return LineOutcome::Failed(format!("Failed to parse Ollama stream: {}", e));
        }
    };

    if let Some(error) = chunk.error {
        return LineOutcome::Failed(format!("Ollama stream error: {}", error));
    }

    let content = chunk
        .message
        .map(|m| m.content)
        .filter(|c| !c.is_empty());

    if chunk.done {
        LineOutcome::Done(content)
    } else {
        content.map_or(LineOutcome::Skip, LineOutcome::Fragment)
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse> {
        let response = self.post_chat(model, messages, false).await?;

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            BardError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let content = ollama_response.message.content;
        let response = if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            let usage = TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            );
            CompletionResponse::with_usage(content, usage)
        } else {
            CompletionResponse::new(content)
        };

        Ok(response)
    }

    async fn complete_stream(&self, model: &str, messages: &[Message]) -> Result<CompletionStream> {
        let response = self.post_chat(model, messages, true).await?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let byte_stream = response.bytes_stream();
        tokio::spawn(async move {
            parse_ndjson_stream(byte_stream, tx).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.endpoint("/api/tags");
        tracing::debug!("Fetching models from Ollama: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch Ollama models: {}", e);
            BardError::Provider(format!("Failed to connect to Ollama server: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(BardError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let tags: OllamaTagsResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama tags response: {}", e);
            BardError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!("Fetched {} models from Ollama", tags.models.len());
        Ok(tags.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> impl Stream<Item = reqwest::Result<Bytes>> {
        let owned: Vec<reqwest::Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.as_bytes().to_vec())))
            .collect();
        futures::stream::iter(owned)
    }

    type Outcome = std::result::Result<String, String>;

    async fn collect(parts: &[&str]) -> Vec<Outcome> {
        let (tx, rx) = mpsc::channel(16);
        parse_ndjson_stream(chunks(parts), tx).await;
        ReceiverStream::new(rx)
            .map(|r| r.map_err(|e| e.to_string()))
            .collect()
            .await
    }

    #[test]
    fn test_ollama_provider_creation() {
        assert!(OllamaProvider::new(OllamaConfig::default()).is_ok());
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let config = OllamaConfig {
            host: "http://localhost:11434/".to_string(),
            ..OllamaConfig::default()
        };
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.endpoint("/api/tags"), "http://localhost:11434/api/tags");
    }

    #[test]
    fn test_request_serializes_like_ollama_expects() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        let request = OllamaRequest {
            model: "gemma3:1b",
            messages: &messages,
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gemma3:1b");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_parse_ndjson_stream_yields_fragments_until_done() {
        let out = collect(&[
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        ])
        .await;
        let expected: Vec<Outcome> = vec![Ok("Hel".to_string()), Ok("lo".to_string())];
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_parse_ndjson_stream_handles_split_lines_and_multibyte() {
        let line = "{\"message\":{\"content\":\"caf\u{e9} \u{1f600}\"},\"done\":false}\n";
        let bytes = line.as_bytes();
        // Split inside the emoji's UTF-8 sequence
        let split = line.find('\u{1f600}').unwrap() + 2;
        let (tx, rx) = mpsc::channel(16);
        let parts: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from(bytes[..split].to_vec())),
            Ok(Bytes::from(bytes[split..].to_vec())),
            Ok(Bytes::from_static(b"{\"done\":true}")),
        ];
        parse_ndjson_stream(futures::stream::iter(parts), tx).await;
        let out: Vec<String> = ReceiverStream::new(rx).map(|r| r.unwrap()).collect().await;
        assert_eq!(out, vec!["caf\u{e9} \u{1f600}".to_string()]);
    }

    #[tokio::test]
    async fn test_parse_ndjson_stream_reports_error_line() {
        let out = collect(&[
            "{\"message\":{\"content\":\"partial\"},\"done\":false}\n",
            "{\"error\":\"model crashed\"}\n",
        ])
        .await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Outcome::Ok("partial".to_string()));
        assert!(out[1].as_ref().unwrap_err().contains("model crashed"));
    }

    #[tokio::test]
    async fn test_parse_ndjson_stream_reports_truncated_stream() {
        let out = collect(&["{\"message\":{\"content\":\"cut\"},\"done\":false}\n"]).await;
        assert_eq!(out.len(), 2);
        assert!(out[1]
            .as_ref()
            .unwrap_err()
            .contains("ended before completion"));
    }

    #[tokio::test]
    async fn test_parse_ndjson_stream_rejects_garbage() {
        let out = collect(&["not json\n"]).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
    }
}
