//! Per-turn resolution of the agent configuration: request overrides, the
//! stored agent definition (including sub-agents for supervisor mode) and
//! the tool registry, composed into one engine run spec.

use crate::error::ApiResult;
use crate::state::AppState;
use genie_graph::{RunSpec, SubAgentSpec};
use genie_mcp::{filter_allowed, ServerConfig, ServerTransport, ToolRegistry};
use genie_persist::{Agent, McpServer, McpServerType};
use genie_types::{TurnOptions, UserInfo};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::collections::HashMap;

/// Build the run spec for one turn.
///
/// Precedence for model/provider/tools/prompt: the stored agent definition
/// (when one is associated) wins over per-request overrides, which win over
/// configured defaults. Sub-agents on the definition switch the spec into
/// supervisor mode.
pub async fn build_run_spec(
    state: &AppState,
    user: &UserInfo,
    thread_id: &str,
    options: &TurnOptions,
    agent: Option<Agent>,
) -> ApiResult<RunSpec> {
    let defaults = &state.config.llm;

    let mut provider = options
        .provider
        .clone()
        .unwrap_or_else(|| defaults.default_provider.clone());
    let mut model = options
        .model
        .clone()
        .unwrap_or_else(|| defaults.default_model.clone());
    let mut allowed_tools = options.tools.clone();
    let mut system_prompt: Option<String> = None;
    let mut recursion_limit = genie_graph::DEFAULT_RECURSION_LIMIT;
    let mut sub_agent_ids: Vec<String> = Vec::new();

    if let Some(agent) = agent {
        provider = agent.provider;
        model = agent.model_name;
        if !agent.tools.is_empty() {
            allowed_tools = Some(agent.tools);
        }
        if !agent.system_prompt.is_empty() {
            system_prompt = Some(agent.system_prompt);
        }
        sub_agent_ids = agent.sub_agent_ids;
        recursion_limit = agent.recursion_limit;
    }

    // Tool definitions are loaded fresh from the caller's enabled servers on
    // every turn; nothing is cached across turns.
    let servers = state.persist.mcp_servers().list_enabled(user.resolved_id()).await?;
    let server_configs: Vec<ServerConfig> =
        servers.iter().filter_map(server_config).collect();
    let all_tools = ToolRegistry::load_tools(&server_configs).await;
    let tools = filter_allowed(all_tools.clone(), allowed_tools.as_deref());

    let mut spec = RunSpec::new(thread_id, provider, model)
        .with_tools(tools)
        .with_recursion_limit(recursion_limit)
        .with_approve_all_tools(options.approve_all_tools);
    if let Some(prompt) = system_prompt {
        spec = spec.with_system_prompt(prompt);
    }

    if !sub_agent_ids.is_empty() {
        let ids: Vec<ObjectId> = sub_agent_ids
            .iter()
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();
        let sub_agents = state.persist.agents().load_many(&ids).await?;

        let specs: Vec<SubAgentSpec> = sub_agents
            .into_iter()
            .map(|sub| {
                let sub_tools = if sub.tools.is_empty() {
                    all_tools.clone()
                } else {
                    filter_allowed(all_tools.clone(), Some(&sub.tools))
                };
                SubAgentSpec {
                    name: sub.name,
                    description: sub.description,
                    provider: sub.provider,
                    model: sub.model_name,
                    system_prompt: sub.system_prompt,
                    tools: sub_tools,
                }
            })
            .collect();

        spec = spec.with_sub_agents(specs);
    }

    Ok(spec)
}

/// Translate a stored server registration into connection parameters.
/// Registrations with unusable fields resolve to nothing and are skipped.
fn server_config(server: &McpServer) -> Option<ServerConfig> {
    let transport = match server.server_type {
        McpServerType::Stdio => ServerTransport::Stdio {
            command: server.command.clone()?,
            args: string_items(server.args.as_ref()),
            env: string_map(server.env.as_ref()),
        },
        McpServerType::Http => ServerTransport::Http { url: server.url.clone()? },
    };

    Some(ServerConfig { name: server.name.clone(), transport })
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_and_env_tolerate_odd_shapes() {
        let args = json!(["--port", "8000", 42]);
        assert_eq!(string_items(Some(&args)), vec!["--port".to_string(), "8000".to_string()]);
        assert!(string_items(Some(&json!("not an array"))).is_empty());
        assert!(string_items(None).is_empty());

        let env = json!({ "API_KEY": "secret", "NUM": 3 });
        let map = string_map(Some(&env));
        assert_eq!(map.get("API_KEY").map(String::as_str), Some("secret"));
        assert!(!map.contains_key("NUM"));
    }
}
