use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub(crate) fn default_recursion_limit() -> u32 {
    25
}

/// Persisted agent definition: system prompt, target model, tool allow-list
/// and optional sub-agents (supervisor mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub system_prompt: String,
    pub model_name: String,
    pub provider: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub sub_agent_ids: Vec<String>,
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied agent fields, shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub system_prompt: String,
    pub model_name: String,
    pub provider: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub sub_agent_ids: Vec<String>,
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,
}
