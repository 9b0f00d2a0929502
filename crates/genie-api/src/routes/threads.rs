use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use genie_persist::Thread;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id.to_hex(),
            title: thread.title,
            agent_id: thread.agent_id.map(|id| id.to_hex()),
            created_at: thread.created_at.to_rfc3339(),
            updated_at: thread.updated_at.to_rfc3339(),
        }
    }
}

fn parse_id(id: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid thread ID format".to_string()))
}

pub async fn list_threads(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ThreadResponse>>> {
    let threads = state.persist.threads().list(user.resolved_id()).await?;
    Ok(Json(threads.into_iter().map(ThreadResponse::from).collect()))
}

pub async fn create_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let thread = state.persist.threads().create(&user).await?;
    Ok((StatusCode::CREATED, Json(thread.into())))
}

pub async fn get_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.persist.threads().get_owned(parse_id(&id)?, &user).await?;
    Ok(Json(thread.into()))
}

#[derive(Debug, Deserialize)]
pub struct RenameThreadRequest {
    pub id: String,
    pub title: String,
}

pub async fn rename_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<RenameThreadRequest>,
) -> ApiResult<Json<ThreadResponse>> {
    if req.title.is_empty() {
        return Err(ApiError::BadRequest("id and title required".to_string()));
    }
    let thread = state
        .persist
        .threads()
        .rename(parse_id(&req.id)?, &user, &req.title)
        .await?;
    Ok(Json(thread.into()))
}

#[derive(Debug, Deserialize)]
pub struct DeleteThreadRequest {
    pub id: String,
}

/// Delete a thread. Engine checkpoints for it are deliberately left behind.
pub async fn delete_thread(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<DeleteThreadRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.persist.threads().remove(parse_id(&req.id)?, &user).await?;
    Ok(Json(json!({ "success": true })))
}
