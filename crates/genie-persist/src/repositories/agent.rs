use chrono::Utc;
use futures::TryStreamExt;
use genie_types::UserInfo;
use mongodb::bson::oid::ObjectId;
use mongodb::{bson::doc, Client, Collection};
use std::collections::HashSet;

use crate::error::{PersistError, Result};
use crate::models::{Agent, AgentDraft};

#[derive(Clone)]
pub struct AgentRepository {
    collection: Collection<Agent>,
}

impl AgentRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("agents");
        Self { collection }
    }

    fn validate_draft(draft: &AgentDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(PersistError::Validation("name is required".to_string()));
        }
        if draft.system_prompt.trim().is_empty() {
            return Err(PersistError::Validation("systemPrompt is required".to_string()));
        }
        if draft.model_name.trim().is_empty() || draft.provider.trim().is_empty() {
            return Err(PersistError::Validation(
                "modelName and provider are required".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn create(&self, draft: AgentDraft, user: &UserInfo) -> Result<Agent> {
        Self::validate_draft(&draft)?;

        let id = ObjectId::new();
        self.assert_acyclic(id, &draft.sub_agent_ids).await?;

        let now = Utc::now();
        let agent = Agent {
            id,
            user_id: user.resolved_id().to_string(),
            user_name: user.user_name.clone(),
            user_email: user.user_email.clone(),
            name: draft.name,
            description: draft.description,
            system_prompt: draft.system_prompt,
            model_name: draft.model_name,
            provider: draft.provider,
            tools: draft.tools,
            sub_agent_ids: draft.sub_agent_ids,
            recursion_limit: draft.recursion_limit,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&agent).await?;
        Ok(agent)
    }

    pub async fn get(&self, agent_id: ObjectId) -> Result<Option<Agent>> {
        Ok(self.collection.find_one(doc! { "_id": agent_id }).await?)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Agent>> {
        let agents = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(agents)
    }

    /// Load the definitions referenced as sub-agents, in no particular order.
    /// Dangling references are skipped.
    pub async fn load_many(&self, ids: &[ObjectId]) -> Result<Vec<Agent>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let agents = self
            .collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?
            .try_collect()
            .await?;
        Ok(agents)
    }

    pub async fn update(
        &self,
        agent_id: ObjectId,
        draft: AgentDraft,
        user: &UserInfo,
    ) -> Result<Agent> {
        Self::validate_draft(&draft)?;
        self.assert_acyclic(agent_id, &draft.sub_agent_ids).await?;

        let update = doc! { "$set": {
            "name": draft.name.as_str(),
            "description": draft.description.as_deref(),
            "system_prompt": draft.system_prompt.as_str(),
            "model_name": draft.model_name.as_str(),
            "provider": draft.provider.as_str(),
            "tools": draft.tools.clone(),
            "sub_agent_ids": draft.sub_agent_ids.clone(),
            "recursion_limit": draft.recursion_limit as i64,
            "updated_at": bson::DateTime::now(),
        } };

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": agent_id, "user_id": user.resolved_id() },
                update,
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| PersistError::AgentNotFound(agent_id.to_hex()))
    }

    pub async fn delete(&self, agent_id: ObjectId, user: &UserInfo) -> Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": agent_id, "user_id": user.resolved_id() })
            .await?;

        if result.deleted_count == 0 {
            return Err(PersistError::AgentNotFound(agent_id.to_hex()));
        }
        Ok(())
    }

    /// Reject a sub-agent list through which `editing` can reach itself,
    /// directly or via a chain of supervisors. Walked at save time so the
    /// execution path never has to care.
    async fn assert_acyclic(&self, editing: ObjectId, sub_agent_ids: &[String]) -> Result<()> {
        let editing_hex = editing.to_hex();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: Vec<String> = sub_agent_ids.to_vec();

        while let Some(id) = queue.pop() {
            if id == editing_hex {
                return Err(PersistError::Validation(
                    "agent may not delegate to itself, directly or through other agents"
                        .to_string(),
                ));
            }
            if !visited.insert(id.clone()) {
                continue;
            }

            let object_id = match ObjectId::parse_str(&id) {
                Ok(oid) => oid,
                // Unparseable references cannot form a cycle; they are
                // dangling and get skipped at run time too.
                Err(_) => continue,
            };

            if let Some(agent) = self.get(object_id).await? {
                queue.extend(agent.sub_agent_ids);
            }
        }

        Ok(())
    }
}
