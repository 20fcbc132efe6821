//! Bard - chat backend for a local Ollama runtime
//!
//! This library provides the HTTP chat API, its orchestration logic, the
//! Ollama provider and the SQLite session store.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: turn orchestration (validate, resolve session, generate, persist)
//! - `providers`: inference provider abstraction and the Ollama client
//! - `storage`: sessions and chat history in SQLite
//! - `title`: session title generation and cleanup
//! - `validate`: session id and model checks
//! - `server`: axum router, handlers and HTTP error mapping
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use bard::chat::ChatService;
//! use bard::providers::OllamaProvider;
//! use bard::storage::SqliteStorage;
//! use bard::Config;
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! config.validate()?;
//!
//! let provider = OllamaProvider::new(config.ollama.clone())?;
//! let storage = SqliteStorage::from_config(&config.storage)?;
//! let chat = ChatService::new(
//!     Arc::new(provider),
//!     storage,
//!     config.ollama.default_model.clone(),
//!     config.chat.clone(),
//! );
//! # let _ = chat;
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod storage;
pub mod title;
pub mod validate;

// Re-export commonly used types
pub use chat::{ChatRequest, ChatService, SessionDetail};
pub use config::Config;
pub use error::{BardError, Result};

#[cfg(test)]
pub mod test_utils;
