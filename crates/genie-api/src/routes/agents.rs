use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use genie_persist::{Agent, AgentDraft};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub system_prompt: String,
    pub model_name: String,
    pub provider: String,
    pub tools: Vec<String>,
    pub sub_agent_ids: Vec<String>,
    pub recursion_limit: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Agent> for AgentResponse {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id.to_hex(),
            name: agent.name,
            description: agent.description,
            system_prompt: agent.system_prompt,
            model_name: agent.model_name,
            provider: agent.provider,
            tools: agent.tools,
            sub_agent_ids: agent.sub_agent_ids,
            recursion_limit: agent.recursion_limit,
            created_at: agent.created_at.to_rfc3339(),
            updated_at: agent.updated_at.to_rfc3339(),
        }
    }
}

fn parse_id(id: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid agent ID format".to_string()))
}

pub async fn list_agents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<AgentResponse>>> {
    let agents = state.persist.agents().list(user.resolved_id()).await?;
    Ok(Json(agents.into_iter().map(AgentResponse::from).collect()))
}

pub async fn create_agent(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<AgentDraft>,
) -> ApiResult<(StatusCode, Json<AgentResponse>)> {
    let agent = state.persist.agents().create(draft, &user).await?;
    Ok((StatusCode::CREATED, Json(agent.into())))
}

pub async fn get_agent(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentResponse>> {
    let agent = state
        .persist
        .agents()
        .get(parse_id(&id)?)
        .await?
        .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;
    Ok(Json(agent.into()))
}

pub async fn update_agent(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(draft): Json<AgentDraft>,
) -> ApiResult<Json<AgentResponse>> {
    let agent = state.persist.agents().update(parse_id(&id)?, draft, &user).await?;
    Ok(Json(agent.into()))
}

pub async fn delete_agent(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.persist.agents().delete(parse_id(&id)?, &user).await?;
    Ok(Json(json!({ "message": "Agent deleted successfully" })))
}
