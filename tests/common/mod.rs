use async_trait::async_trait;
use bard::chat::ChatService;
use bard::config::ChatConfig;
use bard::error::{BardError, Result};
use bard::prompts::TITLE_PROMPT;
use bard::providers::{CompletionResponse, CompletionStream, Message, ModelInfo, Provider};
use bard::server::{router, AppState};
use bard::storage::SqliteStorage;
use axum::Router;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Provider double with a fixed catalog and canned answers
#[allow(dead_code)]
pub struct ScriptedProvider {
    pub models: Vec<String>,
    pub catalog_down: bool,
    pub title: String,
    pub reply: String,
    pub fragments: Vec<String>,
    pub prompts: Mutex<Vec<Vec<Message>>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            models: vec!["gemma3:1b".to_string(), "llama3.2:1b".to_string()],
            catalog_down: false,
            title: "\u{1f5fc} Paris Travel Itinerary Planning".to_string(),
            reply: "You should visit the Louvre.".to_string(),
            fragments: vec![
                "You should ".to_string(),
                "visit the ".to_string(),
                "Louvre.".to_string(),
            ],
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn catalog_down(mut self) -> Self {
        self.catalog_down = true;
        self
    }

    /// Prompts of non-title requests, in arrival order
    pub fn chat_prompts(&self) -> Vec<Vec<Message>> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.first().map(|m| m.content != TITLE_PROMPT).unwrap_or(true))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, _model: &str, messages: &[Message]) -> Result<CompletionResponse> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        if messages.first().map(|m| m.content == TITLE_PROMPT).unwrap_or(false) {
            return Ok(CompletionResponse::new(self.title.clone()));
        }
        Ok(CompletionResponse::new(self.reply.clone()))
    }

    async fn complete_stream(&self, _model: &str, messages: &[Message]) -> Result<CompletionStream> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if self.catalog_down {
            return Err(BardError::Provider("connection refused".into()).into());
        }
        Ok(self.models.iter().map(ModelInfo::new).collect())
    }
}

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let storage = SqliteStorage::new_with_path(tmp.path().join("bard.db"))
        .expect("failed to create sqlite storage with path");
    (storage, tmp)
}

/// Router over a fresh store; keep the `TempDir` alive for the test
#[allow(dead_code)]
pub fn test_app(provider: Arc<ScriptedProvider>) -> (Router, ChatService, TempDir) {
    let (storage, tmp) = create_temp_storage();
    let config = ChatConfig {
        persist_attempts: 3,
        retry_backoff_ms: 5,
    };
    let chat = ChatService::new(provider, storage, "gemma3:1b", config);
    (router(AppState::new(chat.clone()), &[]), chat, tmp)
}
