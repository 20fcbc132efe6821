use super::error::ApiError;
use super::AppState;
use crate::chat::{ChatRequest, SessionDetail, DEFAULT_USER};
use crate::providers::ModelInfo;
use crate::storage::Session;
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(default = "default_user")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Hello World!" }))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "message": "OK!" }))
}

pub async fn models_handler(State(state): State<AppState>) -> Result<Json<Vec<ModelInfo>>, ApiError> {
    let models = state.chat.models().await.map_err(|e| {
        tracing::error!("Failed to fetch models: {:#}", e);
        ApiError::internal(format!("Failed to fetch models: {}", e))
    })?;
    Ok(Json(models))
}

pub async fn sessions_handler(
    State(state): State<AppState>,
    query: Result<Query<SessionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let Query(query) = query?;
    let sessions = state.chat.sessions_for(&query.name).await?;
    Ok(Json(sessions))
}

pub async fn session_handler(
    State(state): State<AppState>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Json<SessionDetail>, ApiError> {
    let Query(query) = query?;
    let detail = state.chat.session_with_messages(&query.session_id).await?;
    Ok(Json(detail))
}

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let reply = state.chat.chat(request).await?;
    Ok(Json(json!({ "message": reply })))
}

pub async fn stream_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let fragments = state.chat.stream(request).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(fragments),
    )
        .into_response())
}
