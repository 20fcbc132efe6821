//! Configuration management for Bard
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{BardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Bard
///
/// This structure holds everything the server needs: where to listen,
/// which inference runtime to talk to, where to keep sessions, and how
/// hard to try when persisting a streamed turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Ollama inference runtime configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Session and history storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat turn behaviour
    #[serde(default)]
    pub chat: ChatConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Allowed CORS origins; an empty list allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model used when a chat request does not name one
    #[serde(default = "default_ollama_model")]
    pub default_model: String,

    /// Connect timeout for requests to the runtime (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma3:1b".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            default_model: default_ollama_model(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path; `None` uses the platform data directory
    #[serde(default)]
    pub path: Option<String>,
}

/// Chat turn configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Attempts made to persist a streamed turn before it is reported lost
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: u32,

    /// Delay between persistence attempts, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_persist_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            persist_attempts: default_persist_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BardError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BardError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("BARD_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("BARD_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid BARD_PORT: {}", port);
            }
        }

        if let Ok(origins) = std::env::var("BARD_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        // OLLAMA_BASE_URL is what existing deployments already export
        if let Ok(ollama_host) =
            std::env::var("BARD_OLLAMA_HOST").or_else(|_| std::env::var("OLLAMA_BASE_URL"))
        {
            self.ollama.host = ollama_host;
        }

        if let Ok(model) = std::env::var("BARD_DEFAULT_MODEL") {
            self.ollama.default_model = model;
        }

        if let Ok(db_path) = std::env::var("BARD_DB_PATH") {
            self.storage.path = Some(db_path);
        }

        if let Ok(attempts) = std::env::var("BARD_PERSIST_ATTEMPTS") {
            if let Ok(value) = attempts.parse() {
                self.chat.persist_attempts = value;
            } else {
                tracing::warn!("Invalid BARD_PERSIST_ATTEMPTS: {}", attempts);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.storage_path {
            self.storage.path = Some(path.clone());
        }

        if let crate::cli::Commands::Serve { host, port } = &cli.command {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(BardError::Config("server.host cannot be empty".to_string()).into());
        }

        if self.server.port == 0 {
            return Err(
                BardError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        if !(self.ollama.host.starts_with("http://") || self.ollama.host.starts_with("https://")) {
            return Err(BardError::Config(format!(
                "ollama.host must start with http:// or https://, got: {}",
                self.ollama.host
            ))
            .into());
        }

        if self.ollama.default_model.trim().is_empty() {
            return Err(
                BardError::Config("ollama.default_model cannot be empty".to_string()).into(),
            );
        }

        if self.chat.persist_attempts == 0 {
            return Err(BardError::Config(
                "chat.persist_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
