//! Command-line interface definition for Bard
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for running the server and inspecting stored state.

use clap::{Parser, Subcommand};

/// Bard - chat backend for a local Ollama runtime
///
/// Serves the chat HTTP API and offers a few commands for looking at the
/// model catalog and stored sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "bard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the SQLite database path
    #[arg(long, env = "BARD_DB_PATH")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Bard
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the chat HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect the models served by the inference runtime
    Models {
        /// Model subcommand
        #[command(subcommand)]
        command: ModelCommand,
    },

    /// Inspect stored chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Model subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ModelCommand {
    /// List models currently servable by Ollama
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions owned by a user, newest first
    List {
        /// Owner name
        #[arg(short, long, default_value = "User")]
        name: String,
    },

    /// Print the full transcript of one session
    Show {
        /// Session id (UUID)
        session_id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::try_parse_from(["bard", "serve"]).unwrap();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }

    #[test]
    fn test_cli_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["bard", "serve", "--host", "127.0.0.1", "-p", "9001"])
            .unwrap();
        if let Commands::Serve { host, port } = cli.command {
            assert_eq!(host.as_deref(), Some("127.0.0.1"));
            assert_eq!(port, Some(9001));
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_cli_parse_models_list_json() {
        let cli = Cli::try_parse_from(["bard", "models", "list", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Models {
                command: ModelCommand::List { json: true }
            }
        ));
    }

    #[test]
    fn test_cli_parse_sessions_list_default_name() {
        let cli = Cli::try_parse_from(["bard", "sessions", "list"]).unwrap();
        if let Commands::Sessions {
            command: SessionCommand::List { name },
        } = cli.command
        {
            assert_eq!(name, "User");
        } else {
            panic!("Expected Sessions List command");
        }
    }

    #[test]
    fn test_cli_parse_sessions_show() {
        let cli = Cli::try_parse_from([
            "bard",
            "--verbose",
            "sessions",
            "show",
            "123e4567-e89b-12d3-a456-426614174000",
        ])
        .unwrap();
        assert!(cli.verbose);
        if let Commands::Sessions {
            command: SessionCommand::Show { session_id },
        } = cli.command
        {
            assert_eq!(session_id, "123e4567-e89b-12d3-a456-426614174000");
        } else {
            panic!("Expected Sessions Show command");
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["bard"]).is_err());
    }
}
