use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use genie_persist::{McpServer, McpServerDraft};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: genie_persist::McpServerType,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<McpServer> for McpServerResponse {
    fn from(server: McpServer) -> Self {
        Self {
            id: server.id.to_hex(),
            name: server.name,
            server_type: server.server_type,
            enabled: server.enabled,
            command: server.command,
            args: server.args,
            env: server.env,
            url: server.url,
            headers: server.headers,
            created_at: server.created_at.to_rfc3339(),
            updated_at: server.updated_at.to_rfc3339(),
        }
    }
}

pub async fn list_servers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<McpServerResponse>>> {
    let servers = state.persist.mcp_servers().list(user.resolved_id()).await?;
    Ok(Json(servers.into_iter().map(McpServerResponse::from).collect()))
}

pub async fn create_server(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<McpServerDraft>,
) -> ApiResult<(StatusCode, Json<McpServerResponse>)> {
    let server = state.persist.mcp_servers().create(draft, &user).await?;
    Ok((StatusCode::CREATED, Json(server.into())))
}

#[derive(Debug, Deserialize)]
pub struct UpdateServerRequest {
    pub id: String,
    #[serde(flatten)]
    pub draft: McpServerDraft,
}

pub async fn update_server(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateServerRequest>,
) -> ApiResult<Json<McpServerResponse>> {
    let id = ObjectId::parse_str(&req.id)
        .map_err(|_| ApiError::BadRequest("Invalid server ID format".to_string()))?;
    let server = state.persist.mcp_servers().update(id, req.draft, &user).await?;
    Ok(Json(server.into()))
}

#[derive(Debug, Deserialize)]
pub struct DeleteServerRequest {
    pub id: String,
}

pub async fn delete_server(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<DeleteServerRequest>,
) -> ApiResult<Json<Value>> {
    let id = ObjectId::parse_str(&req.id)
        .map_err(|_| ApiError::BadRequest("Invalid server ID format".to_string()))?;
    state.persist.mcp_servers().delete(id, &user).await?;
    Ok(Json(json!({ "success": true })))
}
