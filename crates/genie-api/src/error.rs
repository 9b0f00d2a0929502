use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use genie_persist::PersistError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Unauthorized(msg) => ApiError::Forbidden(msg),
            PersistError::Validation(msg) => ApiError::BadRequest(msg),
            PersistError::InvalidObjectId(id) => {
                ApiError::BadRequest(format!("Invalid id: {}", id))
            }
            PersistError::ThreadNotFound(id) => {
                ApiError::NotFound(format!("Thread not found: {}", id))
            }
            PersistError::AgentNotFound(id) => {
                ApiError::NotFound(format!("Agent not found: {}", id))
            }
            PersistError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
