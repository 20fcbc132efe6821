//! Chat orchestration
//!
//! A chat turn moves through [`TurnState`]: the session id and model are
//! validated first, then the session is resolved (created with a generated
//! title when new), the history is loaded, the model is invoked and finally
//! the user message and the reply are persisted as one batch.

use crate::config::ChatConfig;
use crate::error::{BardError, Result};
use crate::prompts::CHAT_SYSTEM_PROMPT;
use crate::providers::{Message, ModelInfo, Provider};
use crate::storage::{ChatMessage, Session, SqliteStorage};
use crate::title::{finalize_title, generate_title};
use crate::validate::{canonical_session_id, validate_model};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Owner name used when a request does not carry one
pub const DEFAULT_USER: &str = "User";

/// Buffered fragments between the model task and the HTTP response body
const STREAM_CHANNEL_CAPACITY: usize = 64;

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Body of `POST /chat` and `POST /stream`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_user")]
    pub name: String,
    pub session_id: String,
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// A session together with its full history
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: Session,
    pub messages: Vec<ChatMessage>,
}

/// Lifecycle of a single chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Validating,
    ResolvingSession,
    LoadingHistory,
    Generating,
    Persisting,
    Done,
    Rejected,
}

/// Everything a validated turn needs to call the model and persist
struct PreparedTurn {
    session_id: String,
    model: String,
    prompt: Vec<Message>,
    user_message: ChatMessage,
}

/// Coordinates validation, session resolution, inference and persistence
#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn Provider>,
    storage: SqliteStorage,
    default_model: String,
    config: ChatConfig,
}

/// Run a blocking store operation off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BardError::Storage(format!("Store task failed: {}", e)))?
}

/// Linear backoff before retry number `attempt + 1`
fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}

fn transition(session_id: &str, state: TurnState) {
    tracing::debug!(session_id = %session_id, state = ?state, "chat turn state");
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn Provider>,
        storage: SqliteStorage,
        default_model: impl Into<String>,
        config: ChatConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            default_model: default_model.into(),
            config,
        }
    }

    /// Live model catalog
    pub async fn models(&self) -> Result<Vec<ModelInfo>> {
        self.provider.list_models().await
    }

    /// Sessions owned by `owner`, newest first
    pub async fn sessions_for(&self, owner: &str) -> Result<Vec<Session>> {
        let storage = self.storage.clone();
        let owner = owner.to_string();
        blocking(move || storage.list_sessions(&owner)).await
    }

    /// Session metadata plus its ordered history
    ///
    /// # Errors
    ///
    /// [`BardError::InvalidSessionId`] for malformed ids and
    /// [`BardError::SessionNotFound`] when no such session exists.
    pub async fn session_with_messages(&self, session_id: &str) -> Result<SessionDetail> {
        let session_id = canonical_session_id(session_id).ok_or(BardError::InvalidSessionId)?;

        let storage = self.storage.clone();
        blocking(move || {
            let session = storage
                .get_session(&session_id)?
                .ok_or(BardError::SessionNotFound)?;
            let messages = storage.read_messages(&session_id)?;
            Ok(SessionDetail { session, messages })
        })
        .await
    }

    /// Run one single-shot turn and return the assistant's full reply
    pub async fn chat(&self, request: ChatRequest) -> Result<String> {
        let turn = self.prepare(&request).await?;

        transition(&turn.session_id, TurnState::Generating);
        let response = self.provider.complete(&turn.model, &turn.prompt).await?;

        transition(&turn.session_id, TurnState::Persisting);
        let reply = ChatMessage::assistant(response.content.clone(), turn.model.clone());
        let storage = self.storage.clone();
        let session_id = turn.session_id.clone();
        blocking(move || storage.append_messages(&session_id, &[turn.user_message, reply]))
            .await?;

        transition(&turn.session_id, TurnState::Done);
        Ok(response.content)
    }

    /// Run one streaming turn
    ///
    /// Validation and session resolution complete before this returns, so
    /// their failures surface as ordinary errors. The returned stream yields
    /// reply fragments; the turn is persisted by a detached task once the
    /// model finishes, whether or not the caller is still reading.
    pub async fn stream(&self, request: ChatRequest) -> Result<ReceiverStream<Result<String>>> {
        let turn = self.prepare(&request).await?;

        transition(&turn.session_id, TurnState::Generating);
        let mut fragments = self
            .provider
            .complete_stream(&turn.model, &turn.prompt)
            .await?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let service = self.clone();

        tokio::spawn(async move {
            let mut reply = String::new();
            let mut receiver_open = true;

            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        reply.push_str(&fragment);
                        if receiver_open && tx.send(Ok(fragment)).await.is_err() {
                            tracing::debug!(
                                "Client for session {} disconnected, draining model stream",
                                turn.session_id
                            );
                            receiver_open = false;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Model stream failed for session {}, turn not persisted: {}",
                            turn.session_id,
                            e
                        );
                        if receiver_open {
                            let _ = tx.send(Err(e)).await;
                        }
                        return;
                    }
                }
            }
            drop(tx);

            transition(&turn.session_id, TurnState::Persisting);
            service
                .persist_turn(turn.session_id.clone(), turn.user_message, reply, turn.model)
                .await;
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Persist a finished streamed turn, retrying with linear backoff
    async fn persist_turn(
        &self,
        session_id: String,
        user_message: ChatMessage,
        reply: String,
        model: String,
    ) {
        let batch = vec![user_message, ChatMessage::assistant(reply, model)];
        let attempts = self.config.persist_attempts.max(1);

        for attempt in 1..=attempts {
            let storage = self.storage.clone();
            let id = session_id.clone();
            let messages = batch.clone();

            match blocking(move || storage.append_messages(&id, &messages)).await {
                Ok(()) => {
                    transition(&session_id, TurnState::Done);
                    return;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Persisting turn for session {} failed (attempt {}/{}): {}",
                        session_id,
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(retry_backoff(self.config.retry_backoff_ms, attempt)).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Turn for session {} lost after {} attempts: {}",
                        session_id,
                        attempts,
                        e
                    );
                }
            }
        }
    }

    /// Validate the request, resolve its session and build the prompt
    async fn prepare(&self, request: &ChatRequest) -> Result<PreparedTurn> {
        transition(&request.session_id, TurnState::Validating);

        let Some(session_id) = canonical_session_id(&request.session_id) else {
            transition(&request.session_id, TurnState::Rejected);
            return Err(BardError::InvalidSessionId.into());
        };

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        if !validate_model(self.provider.as_ref(), &model).await? {
            transition(&session_id, TurnState::Rejected);
            return Err(BardError::InvalidModel.into());
        }

        // Stamped at receipt so history order follows arrival order
        let user_message = ChatMessage::user(request.content.clone(), request.name.clone());

        transition(&session_id, TurnState::ResolvingSession);
        let storage = self.storage.clone();
        let id = session_id.clone();
        let existing = blocking(move || storage.get_session(&id)).await?;

        if existing.is_none() {
            let raw = generate_title(self.provider.as_ref(), &request.content, &model).await?;
            let title = finalize_title(&raw, &request.content);

            let storage = self.storage.clone();
            let id = session_id.clone();
            let owner = request.name.clone();
            let creation =
                blocking(move || storage.create_session_if_absent(&id, &owner, &title)).await?;

            if creation.created {
                tracing::info!(
                    "Created session {} for {}: {}",
                    session_id,
                    creation.session.username,
                    creation.session.title
                );
            } else {
                tracing::debug!("Session {} was created concurrently", session_id);
            }
        }

        transition(&session_id, TurnState::LoadingHistory);
        let storage = self.storage.clone();
        let id = session_id.clone();
        let history = blocking(move || storage.read_messages(&id)).await?;

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(Message::system(CHAT_SYSTEM_PROMPT));
        prompt.extend(history.iter().map(ChatMessage::to_prompt_message));
        prompt.push(Message::user(request.content.clone()));

        Ok(PreparedTurn {
            session_id,
            model,
            prompt,
            user_message,
        })
    }
}
