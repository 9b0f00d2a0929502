use crate::client::{McpClient, ServerConfig, ToolInfo};

/// Separator between server name and tool name in qualified tool names.
const QUALIFIER: &str = "__";

pub fn qualified_name(server: &str, tool: &str) -> String {
    format!("{}{}{}", server, QUALIFIER, tool)
}

/// Keep only the tools whose qualified name appears in the allow-list.
/// `None` means "everything is allowed".
pub fn filter_allowed(tools: Vec<ToolInfo>, allowed: Option<&[String]>) -> Vec<ToolInfo> {
    match allowed {
        None => tools,
        Some(names) => tools
            .into_iter()
            .filter(|tool| names.iter().any(|n| n == &tool.name))
            .collect(),
    }
}

/// Aggregates tool listings across every configured server.
///
/// Connections are short-lived: the registry is rebuilt per turn, so tool
/// definitions are never stale but every turn pays reconnection cost.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Connect to each server and collect its tools. A server that fails to
    /// connect or list is logged and skipped; the rest still contribute.
    pub async fn load_tools(configs: &[ServerConfig]) -> Vec<ToolInfo> {
        let mut all_tools = Vec::new();

        for config in configs {
            let client = match McpClient::connect(config).await {
                Ok(client) => client,
                Err(e) => {
                    tracing::warn!("Skipping MCP server '{}': {:#}", config.name, e);
                    continue;
                }
            };

            match client.list_tools().await {
                Ok(tools) => all_tools.extend(tools),
                Err(e) => {
                    tracing::warn!("Failed to list tools on '{}': {:#}", config.name, e);
                }
            }

            if let Err(e) = client.shutdown().await {
                tracing::debug!("MCP shutdown error: {:#}", e);
            }
        }

        all_tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str) -> ToolInfo {
        ToolInfo {
            name: name.to_string(),
            description: None,
            input_schema: json!({ "type": "object" }),
        }
    }

    #[test]
    fn qualified_name_joins_with_double_underscore() {
        assert_eq!(qualified_name("weather", "get_forecast"), "weather__get_forecast");
    }

    #[test]
    fn filter_allowed_none_keeps_everything() {
        let tools = vec![tool("a__x"), tool("b__y")];
        assert_eq!(filter_allowed(tools.clone(), None), tools);
    }

    #[test]
    fn filter_allowed_matches_qualified_names() {
        let tools = vec![tool("a__x"), tool("b__y"), tool("b__z")];
        let allowed = vec!["b__y".to_string(), "a__x".to_string()];
        let filtered = filter_allowed(tools, Some(&allowed));
        let names: Vec<_> = filtered.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a__x", "b__y"]);
    }

    #[test]
    fn filter_allowed_empty_list_blocks_everything() {
        let tools = vec![tool("a__x")];
        assert!(filter_allowed(tools, Some(&[])).is_empty());
    }
}
