//! Bard - chat backend for a local Ollama runtime
//!
#![doc = "Main entry point for the Bard server and its inspection commands."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bard::cli::{Cli, Commands, ModelCommand};
use bard::commands;
use bard::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting Bard server");
            commands::serve::run(config).await?;
            Ok(())
        }
        Commands::Models { command } => match command {
            ModelCommand::List { json } => {
                commands::models::list_models(&config, json).await?;
                Ok(())
            }
        },
        Commands::Sessions { command } => {
            commands::sessions::handle_sessions(&config, command)?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "bard=debug,tower_http=debug"
    } else {
        "bard=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // BARD_LOG_FORMAT=json switches to one JSON object per line
    let json = std::env::var("BARD_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
