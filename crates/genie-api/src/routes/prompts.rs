use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use genie_persist::Prompt;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Prompt> for PromptResponse {
    fn from(prompt: Prompt) -> Self {
        Self {
            id: prompt.id.to_hex(),
            name: prompt.name,
            content: prompt.content,
            created_at: prompt.created_at.to_rfc3339(),
            updated_at: prompt.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub name: String,
    pub content: String,
}

fn parse_id(id: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid prompt ID format".to_string()))
}

pub async fn list_prompts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<PromptResponse>>> {
    let prompts = state.persist.prompts().list(user.resolved_id()).await?;
    Ok(Json(prompts.into_iter().map(PromptResponse::from).collect()))
}

pub async fn create_prompt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<PromptRequest>,
) -> ApiResult<(StatusCode, Json<PromptResponse>)> {
    let prompt = state.persist.prompts().create(&req.name, &req.content, &user).await?;
    Ok((StatusCode::CREATED, Json(prompt.into())))
}

pub async fn update_prompt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PromptRequest>,
) -> ApiResult<Json<PromptResponse>> {
    let prompt = state
        .persist
        .prompts()
        .update(parse_id(&id)?, &req.name, &req.content, &user)
        .await?;
    Ok(Json(prompt.into()))
}

pub async fn delete_prompt(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.persist.prompts().delete(parse_id(&id)?, &user).await?;
    Ok(Json(json!({ "success": true })))
}
