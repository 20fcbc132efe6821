//! Test utilities for Bard
//!
//! A scripted in-process provider and a temporary store, so chat logic can
//! be exercised without a running Ollama runtime.

use crate::error::{BardError, Result};
use crate::prompts::TITLE_PROMPT;
use crate::providers::{CompletionResponse, CompletionStream, Message, ModelInfo, Provider};
use crate::storage::SqliteStorage;
use async_trait::async_trait;
use std::sync::Mutex;
use tempfile::TempDir;

/// One request observed by [`FakeProvider`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<Message>,
    pub streaming: bool,
}

/// Provider double with a fixed catalog and scripted replies
///
/// Title requests are recognized by their leading title prompt and answered
/// with the scripted title; every other request gets the scripted reply.
pub struct FakeProvider {
    models: Vec<String>,
    catalog_fails: bool,
    title: String,
    title_fails: bool,
    reply: String,
    reply_fails: bool,
    fragments: Vec<String>,
    stream_fails_after: Option<usize>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeProvider {
    pub fn new(models: &[&str]) -> Self {
        Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            catalog_fails: false,
            title: "\u{1f4ac} Friendly Test Conversation".to_string(),
            title_fails: false,
            reply: "Hello from the model".to_string(),
            reply_fails: false,
            fragments: vec!["Hello ".to_string(), "from the ".to_string(), "model".to_string()],
            stream_fails_after: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog_failure(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_title_failure(mut self) -> Self {
        self.title_fails = true;
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    pub fn with_reply_failure(mut self) -> Self {
        self.reply_fails = true;
        self
    }

    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Stream `n` fragments and then fail
    pub fn with_stream_failure_after(mut self, n: usize) -> Self {
        self.stream_fails_after = Some(n);
        self
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Requests that were not title requests
    pub fn chat_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| !is_title_request(&c.messages))
            .collect()
    }

    fn record(&self, model: &str, messages: &[Message], streaming: bool) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                messages: messages.to_vec(),
                streaming,
            });
        }
    }
}

fn is_title_request(messages: &[Message]) -> bool {
    messages
        .first()
        .map(|m| m.content == TITLE_PROMPT)
        .unwrap_or(false)
}

#[async_trait]
impl Provider for FakeProvider {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<CompletionResponse> {
        self.record(model, messages, false);

        if is_title_request(messages) {
            if self.title_fails {
                return Err(BardError::Provider("title model unavailable".into()).into());
            }
            return Ok(CompletionResponse::new(self.title.clone()));
        }

        if self.reply_fails {
            return Err(BardError::Provider("model crashed".into()).into());
        }
        Ok(CompletionResponse::new(self.reply.clone()))
    }

    async fn complete_stream(&self, model: &str, messages: &[Message]) -> Result<CompletionStream> {
        self.record(model, messages, true);

        if self.reply_fails {
            return Err(BardError::Provider("model crashed".into()).into());
        }

        let mut items: Vec<Result<String>> = Vec::new();
        match self.stream_fails_after {
            Some(n) => {
                items.extend(self.fragments.iter().take(n).cloned().map(Ok));
                items.push(Err(BardError::Provider("stream interrupted".into()).into()));
            }
            None => items.extend(self.fragments.iter().cloned().map(Ok)),
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if self.catalog_fails {
            return Err(BardError::Provider("connection refused".into()).into());
        }
        Ok(self.models.iter().map(ModelInfo::new).collect())
    }
}

/// Create a store in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn temp_storage() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let storage =
        SqliteStorage::new_with_path(dir.path().join("bard.db")).expect("Failed to open store");
    (storage, dir)
}

/// Assert that an error carries the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error containing '{}', got Ok({:?})", expected, value),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(expected),
                "Error message '{}' does not contain '{}'",
                message,
                expected
            );
        }
    }
}
