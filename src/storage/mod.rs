use crate::config::StorageConfig;
use crate::error::{BardError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod types;
pub use types::{ChatMessage, Role, Session, SessionCreation};

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage backend for sessions and chat history
///
/// Every operation opens its own connection and releases it before
/// returning, so one handle can be shared by any number of concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

fn storage_error<E: std::fmt::Display>(what: &'static str) -> impl Fn(E) -> BardError {
    move |e| BardError::Storage(format!("{}: {}", what, e))
}

/// Fixed-width timestamp so that text order equals time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        username: row.get(1)?,
        title: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
    })
}

impl SqliteStorage {
    /// Create a storage instance from configuration
    ///
    /// Uses `storage.path` when set, otherwise `bard.db` in the platform
    /// data directory.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        if let Some(path) = &config.path {
            return Self::new_with_path(path);
        }

        let proj_dirs = ProjectDirs::from("com", "bard", "bard")
            .ok_or_else(|| BardError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("bard.db"))
    }

    /// Create a storage instance that uses the specified database path
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("bard.db")).unwrap();
    /// assert!(storage.db_path().ends_with("bard.db"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(storage_error("Failed to create parent directory for database"))?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        tracing::debug!("Using session store at {}", storage.db_path.display());
        Ok(storage)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path).map_err(storage_error("Failed to open database"))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(storage_error("Failed to set busy timeout"))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))
            .map_err(storage_error("Failed to enable WAL"))?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(storage_error("Failed to enable foreign keys"))?;
        Ok(conn)
    }

    /// Create the schema if it does not exist
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                title TEXT NOT NULL CHECK (length(title) <= 255),
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_username
                ON sessions (username, created_at);
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES sessions (id) ON DELETE CASCADE,
                message_id TEXT NOT NULL UNIQUE,
                message JSON NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_history_session
                ON chat_history (session_id, created_at, id);",
        )
        .map_err(storage_error("Failed to create tables"))?;

        Ok(())
    }

    /// Fetch a session by canonical id
    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.open()?;

        let session = conn
            .query_row(
                "SELECT id, username, title, created_at FROM sessions WHERE id = ?",
                params![id],
                session_from_row,
            )
            .optional()
            .map_err(storage_error("Failed to query session"))?;

        Ok(session)
    }

    /// Insert a session unless one with the same id already exists
    ///
    /// The insert and the read-back run in one immediate transaction, so
    /// concurrent callers racing on a new id all observe the same winning
    /// row and exactly one of them sees `created == true`.
    pub fn create_session_if_absent(
        &self,
        id: &str,
        username: &str,
        title: &str,
    ) -> Result<SessionCreation> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error("Failed to start transaction"))?;

        let now = format_timestamp(&Utc::now());
        let inserted = tx
            .execute(
                "INSERT INTO sessions (id, username, title, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (id) DO NOTHING",
                params![id, username, title, now],
            )
            .map_err(storage_error("Failed to insert session"))?;

        let session = tx
            .query_row(
                "SELECT id, username, title, created_at FROM sessions WHERE id = ?",
                params![id],
                session_from_row,
            )
            .map_err(storage_error("Failed to read back session"))?;

        tx.commit()
            .map_err(storage_error("Failed to commit transaction"))?;

        Ok(SessionCreation {
            session,
            created: inserted == 1,
        })
    }

    /// List sessions owned by `username`, newest first
    pub fn list_sessions(&self, username: &str) -> Result<Vec<Session>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, username, title, created_at
                FROM sessions
                WHERE username = ?
                ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(storage_error("Failed to prepare statement"))?;

        let sessions = stmt
            .query_map(params![username], session_from_row)
            .map_err(storage_error("Failed to query sessions"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error("Failed to read session row"))?;

        Ok(sessions)
    }

    /// Append messages to a session's history in a single transaction
    ///
    /// Either every message is stored or none is.
    pub fn append_messages(&self, session_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(storage_error("Failed to start transaction"))?;

        for message in messages {
            let json = serde_json::to_string(message)
                .map_err(storage_error("Failed to serialize message"))?;
            tx.execute(
                "INSERT INTO chat_history (session_id, message_id, message, created_at)
                VALUES (?, ?, ?, ?)",
                params![
                    session_id,
                    message.id,
                    json,
                    format_timestamp(&message.created_at)
                ],
            )
            .map_err(storage_error("Failed to insert message"))?;
        }

        tx.commit()
            .map_err(storage_error("Failed to commit transaction"))?;

        Ok(())
    }

    /// Read a session's history in conversation order
    pub fn read_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT message FROM chat_history
                WHERE session_id = ?
                ORDER BY created_at ASC, id ASC",
            )
            .map_err(storage_error("Failed to prepare statement"))?;

        let rows = stmt
            .query_map(params![session_id], |row| row.get::<_, String>(0))
            .map_err(storage_error("Failed to query history"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error("Failed to read history row"))?;

        let mut messages = Vec::with_capacity(rows.len());
        for json in rows {
            let message: ChatMessage = serde_json::from_str(&json)
                .map_err(storage_error("Failed to deserialize message"))?;
            messages.push(message);
        }

        Ok(messages)
    }

    /// Number of stored messages for a session
    pub fn count_messages(&self, session_id: &str) -> Result<usize> {
        let conn = self.open()?;

        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM chat_history WHERE session_id = ?",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(storage_error("Failed to count messages"))?;

        Ok(count as usize)
    }
}
