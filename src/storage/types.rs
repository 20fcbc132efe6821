use crate::providers::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A conversation session owned by a named user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Canonical lowercase hyphenated UUID
    pub id: String,
    /// Owner name supplied by the client
    pub username: String,
    /// Title generated from the first user message
    pub title: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Who produced a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One stored turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// ULID assigned when the message is built
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Owner name for user turns, model id for assistant turns
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a user message stamped with a fresh id and the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use bard::storage::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("Hello", "Ada");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.name, "Ada");
    /// ```
    pub fn user(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            role: Role::User,
            content: content.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    /// Build an assistant reply authored by `model`
    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            role: Role::Assistant,
            content: content.into(),
            name: model.into(),
            created_at: Utc::now(),
        }
    }

    /// Convert into the prompt form sent to the inference runtime
    pub fn to_prompt_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(self.content.clone()),
            Role::Assistant => Message::assistant(self.content.clone()),
        }
    }
}

/// Outcome of a create-or-fetch on the sessions table
#[derive(Debug, Clone)]
pub struct SessionCreation {
    /// The stored session (the caller's row or the one that won a race)
    pub session: Session,
    /// Whether this call inserted the row
    pub created: bool,
}
