use futures::TryStreamExt;
use genie_types::UserInfo;
use mongodb::{bson::doc, Client, Collection};

use crate::error::Result;
use crate::models::{FeedbackValue, MessageFeedback};

#[derive(Clone)]
pub struct FeedbackRepository {
    collection: Collection<MessageFeedback>,
}

impl FeedbackRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("message_feedback");
        Self { collection }
    }

    /// All of one user's feedback within a thread.
    pub async fn list_for_thread(
        &self,
        thread_id: &str,
        user: &UserInfo,
    ) -> Result<Vec<MessageFeedback>> {
        let feedback = self
            .collection
            .find(doc! { "thread_id": thread_id, "user_id": user.resolved_id() })
            .await?
            .try_collect()
            .await?;
        Ok(feedback)
    }

    /// Record a judgement, replacing any previous one for the same
    /// (message, user) pair.
    pub async fn upsert(
        &self,
        message_id: &str,
        thread_id: &str,
        value: FeedbackValue,
        user: &UserInfo,
    ) -> Result<MessageFeedback> {
        let now = bson::DateTime::now();
        self.collection
            .update_one(
                doc! { "message_id": message_id, "user_id": user.resolved_id() },
                doc! {
                    "$set": {
                        "thread_id": thread_id,
                        "feedback": bson::to_bson(&value)?,
                        "updated_at": now,
                    },
                    "$setOnInsert": {
                        "_id": mongodb::bson::oid::ObjectId::new(),
                        "message_id": message_id,
                        "user_id": user.resolved_id(),
                        "created_at": now,
                    },
                },
            )
            .upsert(true)
            .await?;

        let stored = self
            .collection
            .find_one(doc! { "message_id": message_id, "user_id": user.resolved_id() })
            .await?
            .ok_or_else(|| {
                crate::error::PersistError::Internal("feedback upsert lost".to_string())
            })?;
        Ok(stored)
    }

    /// Remove a judgement. Removing absent feedback is a no-op.
    pub async fn delete(&self, message_id: &str, user: &UserInfo) -> Result<()> {
        self.collection
            .delete_one(doc! { "message_id": message_id, "user_id": user.resolved_id() })
            .await?;
        Ok(())
    }
}
