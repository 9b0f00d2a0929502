use anyhow::{Context, Result};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess};
use rmcp::ServiceExt;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

use crate::registry::qualified_name;

/// Connection parameters for one registered MCP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub transport: ServerTransport,
}

#[derive(Debug, Clone)]
pub enum ServerTransport {
    Stdio {
        command: String,
        args: Vec<String>,
        env: HashMap<String, String>,
    },
    Http {
        url: String,
    },
}

/// Tool definition as handed to the graph engine. `name` is fully qualified
/// as `server__toolname` so allow-lists stay unambiguous across servers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Client connection to a single MCP server.
pub struct McpClient {
    server_name: String,
    service: RunningService<RoleClient, ()>,
}

impl McpClient {
    /// Connect to a server, spawning a child process for stdio transports.
    pub async fn connect(config: &ServerConfig) -> Result<Self> {
        let service = match &config.transport {
            ServerTransport::Stdio { command, args, env } => {
                let cmd = Command::new(command).configure(|c| {
                    for arg in args {
                        c.arg(arg);
                    }
                    for (key, value) in env {
                        c.env(key, value);
                    }
                    c.stdin(Stdio::piped());
                    c.stdout(Stdio::piped());
                    c.stderr(Stdio::inherit());
                });

                let transport = TokioChildProcess::new(cmd)
                    .with_context(|| format!("Failed to spawn MCP server '{}'", config.name))?;
                ().serve(transport).await.with_context(|| {
                    format!("MCP handshake with '{}' failed", config.name)
                })?
            }
            ServerTransport::Http { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                ().serve(transport).await.with_context(|| {
                    format!("MCP handshake with '{}' failed", config.name)
                })?
            }
        };

        Ok(Self { server_name: config.name.clone(), service })
    }

    pub fn name(&self) -> &str {
        &self.server_name
    }

    /// List the server's tools under their fully qualified names.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let result = self
            .service
            .list_tools(Default::default())
            .await
            .with_context(|| format!("list_tools failed for '{}'", self.server_name))?;

        let tools = result
            .tools
            .into_iter()
            .map(|tool| ToolInfo {
                name: qualified_name(&self.server_name, tool.name.as_ref()),
                description: tool.description.map(|d| d.to_string()),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect();

        Ok(tools)
    }

    /// Shut the connection down, reaping the child process for stdio servers.
    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .with_context(|| format!("Failed to shut down MCP server '{}'", self.server_name))?;
        Ok(())
    }
}
