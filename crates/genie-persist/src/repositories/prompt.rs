use chrono::Utc;
use futures::TryStreamExt;
use genie_types::UserInfo;
use mongodb::bson::oid::ObjectId;
use mongodb::{bson::doc, Client, Collection};

use crate::error::{PersistError, Result};
use crate::models::Prompt;

#[derive(Clone)]
pub struct PromptRepository {
    collection: Collection<Prompt>,
}

impl PromptRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("prompts");
        Self { collection }
    }

    pub async fn create(&self, name: &str, content: &str, user: &UserInfo) -> Result<Prompt> {
        if name.trim().is_empty() || content.trim().is_empty() {
            return Err(PersistError::Validation(
                "name and content are required".to_string(),
            ));
        }

        let now = Utc::now();
        let prompt = Prompt {
            id: ObjectId::new(),
            user_id: user.resolved_id().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&prompt).await?;
        Ok(prompt)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Prompt>> {
        let prompts = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(prompts)
    }

    pub async fn update(
        &self,
        prompt_id: ObjectId,
        name: &str,
        content: &str,
        user: &UserInfo,
    ) -> Result<Prompt> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": prompt_id, "user_id": user.resolved_id() },
                doc! { "$set": {
                    "name": name,
                    "content": content,
                    "updated_at": bson::DateTime::now(),
                } },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| PersistError::NotFound(format!("Prompt {}", prompt_id.to_hex())))
    }

    pub async fn delete(&self, prompt_id: ObjectId, user: &UserInfo) -> Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": prompt_id, "user_id": user.resolved_id() })
            .await?;

        if result.deleted_count == 0 {
            return Err(PersistError::NotFound(format!("Prompt {}", prompt_id.to_hex())));
        }
        Ok(())
    }
}
