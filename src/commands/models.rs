//! Model catalog command
//!
//! Prints the models the configured Ollama runtime can currently serve,
//! either as a table or as the same JSON array `GET /models` returns.

use crate::config::Config;
use crate::error::{BardError, Result};
use crate::providers::{ModelInfo, OllamaProvider, Provider};
use prettytable::{format, row, Table};

/// List models from the configured runtime
///
/// # Examples
///
/// ```no_run
/// use bard::config::Config;
/// use bard::commands::models::list_models;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// list_models(&config, true).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_models(config: &Config, json: bool) -> Result<()> {
    let provider = OllamaProvider::new(config.ollama.clone())?;
    tracing::info!("Listing models from {}", provider.host());

    let models = provider.list_models().await?;

    if json {
        println!("{}", models_json(&models)?);
        return Ok(());
    }

    if models.is_empty() {
        println!("No models available from {}", provider.host());
        return Ok(());
    }

    println!("\nAvailable models from {}:\n", provider.host());
    models_table(&models, &config.ollama.default_model).printstd();
    Ok(())
}

fn models_json(models: &[ModelInfo]) -> Result<String> {
    Ok(serde_json::to_string_pretty(models).map_err(BardError::Serialization)?)
}

fn models_table(models: &[ModelInfo], default_model: &str) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Model Name", "Size", "Modified", "Default"]);

    for model in models {
        let marker = if model.name == default_model { "*" } else { "" };
        table.add_row(row![
            model.name,
            format_size(model.size),
            model.modified_at,
            marker
        ]);
    }

    table
}

/// Human-readable byte count
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(815_319_791), "777.5 MB");
    }

    #[test]
    fn test_models_json_is_array_of_descriptors() {
        let json = models_json(&[ModelInfo::new("gemma3:1b")]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "gemma3:1b");
    }

    #[test]
    fn test_models_table_marks_default() {
        let table = models_table(
            &[ModelInfo::new("gemma3:1b"), ModelInfo::new("llama3.2:1b")],
            "gemma3:1b",
        );
        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("gemma3:1b"));
        assert!(rendered.contains('*'));
    }
}
