use crate::error::BardError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Detail returned for server-side failures whose cause stays in the logs
const INTERNAL_DETAIL: &str = "Internal server error";

/// HTTP error rendered as `{"detail": ...}`
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<BardError> for ApiError {
    fn from(err: BardError) -> Self {
        match &err {
            BardError::InvalidSessionId | BardError::InvalidModel => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            BardError::SessionNotFound => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            BardError::MalformedRequest(detail) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail.clone())
            }
            BardError::CatalogUnavailable(cause) => {
                tracing::error!("Model catalog unavailable: {}", cause);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Model catalog unavailable")
            }
            BardError::Provider(_) | BardError::Http(_) => {
                tracing::error!("{}", err);
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            _ => {
                tracing::error!("{}", err);
                Self::internal(INTERNAL_DETAIL)
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BardError>() {
            Ok(bard) => bard.into(),
            Err(other) => {
                tracing::error!("Unhandled error: {:#}", other);
                Self::internal(INTERNAL_DETAIL)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        BardError::MalformedRequest(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        BardError::MalformedRequest(rejection.body_text()).into()
    }
}
