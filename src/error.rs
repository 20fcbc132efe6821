//! Error types for Bard
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Bard operations
///
/// This enum covers configuration loading, inference provider calls,
/// storage access, and the client input checks performed before a chat
/// turn is allowed to touch any state.
#[derive(Error, Debug)]
pub enum BardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, malformed responses, broken streams)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model catalog could not be fetched from the inference runtime
    #[error("Model catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Session and history storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session id is not a canonical hyphenated UUID
    #[error("Invalid session ID")]
    InvalidSessionId,

    /// Requested model is not served by the inference runtime
    #[error("Invalid model")]
    InvalidModel,

    /// No session exists for the requested id
    #[error("Session not found")]
    SessionNotFound,

    /// Request body or query could not be decoded
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Bard operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
