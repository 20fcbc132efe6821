use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::{BardError, Result};
use crate::storage::{ChatMessage, Role, SqliteStorage};
use crate::validate::canonical_session_id;
use colored::Colorize;
use prettytable::{format, Table};

/// Characters of a title shown in the listing before it is elided
const TITLE_COLUMN_CHARS: usize = 48;

/// Handle session commands
pub fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let storage = SqliteStorage::from_config(&config.storage)?;

    match command {
        SessionCommand::List { name } => {
            let sessions = storage.list_sessions(&name)?;

            if sessions.is_empty() {
                println!("{}", format!("No sessions found for {}.", name).yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Created".bold()
            ]);

            for session in sessions {
                let count = storage.count_messages(&session.id)?;
                let created = session.created_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    session.id.cyan(),
                    elide(&session.title, TITLE_COLUMN_CHARS),
                    count,
                    created
                ]);
            }

            println!("\nSessions for {}:", name);
            table.printstd();
            println!();
            println!("Use {} to read one.", "bard sessions show <ID>".cyan());
            println!();
        }
        SessionCommand::Show { session_id } => {
            let id = canonical_session_id(&session_id).ok_or(BardError::InvalidSessionId)?;
            let session = storage.get_session(&id)?.ok_or(BardError::SessionNotFound)?;

            println!("\n{} {}", session.title.bold(), format!("({})", session.id).dimmed());
            println!(
                "Owner: {}  Created: {}\n",
                session.username,
                session.created_at.format("%Y-%m-%d %H:%M:%S")
            );

            for message in storage.read_messages(&id)? {
                let speaker = match message.role {
                    Role::User => speaker_label(&message).green().bold(),
                    Role::Assistant => speaker_label(&message).blue().bold(),
                };
                println!("{}: {}\n", speaker, message.content);
            }
        }
    }

    Ok(())
}

fn speaker_label(message: &ChatMessage) -> String {
    format!("{} ({})", message.name, message.role.as_str())
}

fn elide(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use tempfile::tempdir;

    fn config_for(path: &std::path::Path) -> Config {
        Config {
            storage: StorageConfig {
                path: Some(path.to_string_lossy().to_string()),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_elide_counts_characters() {
        assert_eq!(elide("short", 10), "short");
        assert_eq!(elide("\u{1f4bb} abcdefghij", 8), "\u{1f4bb} abc...");
    }

    #[test]
    fn test_speaker_label_names_author_and_role() {
        assert_eq!(speaker_label(&ChatMessage::user("hi", "Ada")), "Ada (user)");
        assert_eq!(
            speaker_label(&ChatMessage::assistant("hello", "gemma3:1b")),
            "gemma3:1b (assistant)"
        );
    }

    #[test]
    fn test_list_and_show_on_populated_store() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("bard.db"));
        let storage = SqliteStorage::from_config(&config.storage).unwrap();
        let id = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
        storage
            .create_session_if_absent(id, "Ada", "\u{1f4dd} Essay Outline Ideas")
            .unwrap();
        storage
            .append_messages(
                id,
                &[
                    ChatMessage::user("outline?", "Ada"),
                    ChatMessage::assistant("Sure.", "gemma3:1b"),
                ],
            )
            .unwrap();

        handle_sessions(&config, SessionCommand::List { name: "Ada".into() }).unwrap();
        handle_sessions(
            &config,
            SessionCommand::Show {
                session_id: id.to_uppercase(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_show_rejects_bad_and_unknown_ids() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("bard.db"));

        let err = handle_sessions(
            &config,
            SessionCommand::Show {
                session_id: "abc".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BardError>(),
            Some(BardError::InvalidSessionId)
        ));

        let err = handle_sessions(
            &config,
            SessionCommand::Show {
                session_id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BardError>(),
            Some(BardError::SessionNotFound)
        ));
    }
}
