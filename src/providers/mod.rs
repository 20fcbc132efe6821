//! Provider module for Bard
//!
//! This module contains the inference provider abstraction and the Ollama
//! implementation.

pub mod base;
pub mod ollama;

pub use base::{CompletionResponse, CompletionStream, Message, ModelInfo, Provider, TokenUsage};
pub use ollama::OllamaProvider;
