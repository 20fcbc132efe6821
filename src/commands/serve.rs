use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::providers::OllamaProvider;
use crate::server::{run_server, AppState};
use crate::storage::SqliteStorage;
use std::sync::Arc;

/// Wire the provider, the store and the chat service, then serve
pub async fn run(config: Config) -> Result<()> {
    let provider = OllamaProvider::new(config.ollama.clone())?;
    tracing::info!(
        "Using Ollama at {} (default model {})",
        provider.host(),
        config.ollama.default_model
    );

    let storage = SqliteStorage::from_config(&config.storage)?;
    tracing::info!("Session store: {}", storage.db_path().display());

    let chat = ChatService::new(
        Arc::new(provider),
        storage,
        config.ollama.default_model.clone(),
        config.chat.clone(),
    );

    run_server(&config.server, AppState::new(chat)).await
}
