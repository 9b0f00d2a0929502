use chrono::Utc;
use futures::TryStreamExt;
use genie_types::UserInfo;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson};
use mongodb::{Client, Collection};

use crate::error::{PersistError, Result};
use crate::models::{McpServer, McpServerDraft, McpServerType};

#[derive(Clone)]
pub struct McpServerRepository {
    collection: Collection<McpServer>,
}

fn validate_draft(draft: &McpServerDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(PersistError::Validation("name is required".to_string()));
    }
    match draft.server_type {
        McpServerType::Stdio if draft.command.as_deref().unwrap_or("").is_empty() => Err(
            PersistError::Validation("command is required for stdio servers".to_string()),
        ),
        McpServerType::Http if draft.url.as_deref().unwrap_or("").is_empty() => Err(
            PersistError::Validation("url is required for http servers".to_string()),
        ),
        _ => Ok(()),
    }
}

fn json_to_bson(value: &serde_json::Value) -> Bson {
    bson::to_bson(value).unwrap_or(Bson::Null)
}

impl McpServerRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("mcp_servers");
        Self { collection }
    }

    pub async fn create(&self, draft: McpServerDraft, user: &UserInfo) -> Result<McpServer> {
        validate_draft(&draft)?;

        let is_stdio = draft.server_type == McpServerType::Stdio;
        let now = Utc::now();
        let server = McpServer {
            id: ObjectId::new(),
            user_id: user.resolved_id().to_string(),
            user_name: user.user_name.clone(),
            user_email: user.user_email.clone(),
            name: draft.name,
            server_type: draft.server_type,
            enabled: draft.enabled.unwrap_or(true),
            command: if is_stdio { draft.command } else { None },
            args: if is_stdio { draft.args } else { None },
            env: if is_stdio { draft.env } else { None },
            url: if is_stdio { None } else { draft.url },
            headers: if is_stdio { None } else { draft.headers },
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&server).await?;
        Ok(server)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<McpServer>> {
        let servers = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(servers)
    }

    /// Enabled servers only, for the per-turn tool registry.
    pub async fn list_enabled(&self, user_id: &str) -> Result<Vec<McpServer>> {
        let servers = self
            .collection
            .find(doc! { "user_id": user_id, "enabled": true })
            .await?
            .try_collect()
            .await?;
        Ok(servers)
    }

    /// Update a registration. Switching the transport type clears the fields
    /// of the other transport so stale spawn/endpoint data cannot linger.
    pub async fn update(
        &self,
        server_id: ObjectId,
        draft: McpServerDraft,
        user: &UserInfo,
    ) -> Result<McpServer> {
        validate_draft(&draft)?;

        let mut set = doc! {
            "name": draft.name.as_str(),
            "type": bson::to_bson(&draft.server_type)?,
            "updated_at": bson::DateTime::now(),
        };
        if let Some(enabled) = draft.enabled {
            set.insert("enabled", enabled);
        }

        match draft.server_type {
            McpServerType::Stdio => {
                set.insert("command", draft.command.as_deref().map(Bson::from).unwrap_or(Bson::Null));
                set.insert("args", draft.args.as_ref().map(json_to_bson).unwrap_or(Bson::Null));
                set.insert("env", draft.env.as_ref().map(json_to_bson).unwrap_or(Bson::Null));
                set.insert("url", Bson::Null);
                set.insert("headers", Bson::Null);
            }
            McpServerType::Http => {
                set.insert("url", draft.url.as_deref().map(Bson::from).unwrap_or(Bson::Null));
                set.insert("headers", draft.headers.as_ref().map(json_to_bson).unwrap_or(Bson::Null));
                set.insert("command", Bson::Null);
                set.insert("args", Bson::Null);
                set.insert("env", Bson::Null);
            }
        }

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": server_id, "user_id": user.resolved_id() },
                doc! { "$set": set },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| PersistError::NotFound(format!("MCP server {}", server_id.to_hex())))
    }

    pub async fn delete(&self, server_id: ObjectId, user: &UserInfo) -> Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": server_id, "user_id": user.resolved_id() })
            .await?;

        if result.deleted_count == 0 {
            return Err(PersistError::NotFound(format!(
                "MCP server {}",
                server_id.to_hex()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(server_type: McpServerType) -> McpServerDraft {
        McpServerDraft {
            name: "local".to_string(),
            server_type,
            enabled: None,
            command: None,
            args: None,
            env: None,
            url: None,
            headers: None,
        }
    }

    #[test]
    fn stdio_requires_command() {
        let mut d = draft(McpServerType::Stdio);
        assert!(validate_draft(&d).is_err());
        d.command = Some("python3".to_string());
        assert!(validate_draft(&d).is_ok());
    }

    #[test]
    fn http_requires_url() {
        let mut d = draft(McpServerType::Http);
        assert!(validate_draft(&d).is_err());
        d.url = Some("http://localhost:8000/mcp".to_string());
        assert!(validate_draft(&d).is_ok());
    }
}
