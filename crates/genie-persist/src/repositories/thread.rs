use chrono::Utc;
use futures::TryStreamExt;
use genie_types::{UserInfo, TITLE_PLACEHOLDERS};
use mongodb::bson::oid::ObjectId;
use mongodb::{bson::doc, Client, Collection};

use crate::error::{PersistError, Result};
use crate::models::Thread;

/// Threads a single user may list at once.
const LIST_LIMIT: i64 = 50;

/// Title length cap when deriving a title from the first user message.
const TITLE_SEED_MAX: usize = 100;

#[derive(Clone)]
pub struct ThreadRepository {
    collection: Collection<Thread>,
}

/// Derive an initial title from the first user message, falling back to the
/// placeholder when the seed is blank.
pub fn derive_title(seed: &str) -> String {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return TITLE_PLACEHOLDERS[0].to_string();
    }
    trimmed.chars().take(TITLE_SEED_MAX).collect()
}

/// Ownership check shared by every thread operation that takes a caller.
pub fn verify_owner(thread: &Thread, user: &UserInfo) -> Result<()> {
    if !thread.user_id.is_empty() && thread.user_id != user.resolved_id() {
        return Err(PersistError::Unauthorized(
            "Thread belongs to another user".to_string(),
        ));
    }
    Ok(())
}

impl ThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Create a thread with the placeholder title.
    pub async fn create(&self, user: &UserInfo) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: ObjectId::new(),
            user_id: user.resolved_id().to_string(),
            user_name: user.user_name.clone(),
            user_email: user.user_email.clone(),
            title: TITLE_PLACEHOLDERS[0].to_string(),
            agent_id: None,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&thread).await?;
        Ok(thread)
    }

    /// Return the thread, creating it when absent. Verifies ownership on an
    /// existing record and, when `agent_id` differs from the stored value,
    /// updates the association — callers must treat this as potentially
    /// mutating.
    pub async fn ensure(
        &self,
        thread_id: ObjectId,
        title_seed: &str,
        user: &UserInfo,
        agent_id: Option<ObjectId>,
    ) -> Result<Thread> {
        if let Some(mut existing) = self.get(thread_id).await? {
            verify_owner(&existing, user)?;

            if let Some(agent_id) = agent_id {
                if existing.agent_id != Some(agent_id) {
                    self.collection
                        .update_one(
                            doc! { "_id": thread_id },
                            doc! { "$set": {
                                "agent_id": agent_id,
                                "updated_at": bson::DateTime::now(),
                            } },
                        )
                        .await?;
                    existing.agent_id = Some(agent_id);
                }
            }

            return Ok(existing);
        }

        let now = Utc::now();
        let thread = Thread {
            id: thread_id,
            user_id: user.resolved_id().to_string(),
            user_name: user.user_name.clone(),
            user_email: user.user_email.clone(),
            title: derive_title(title_seed),
            agent_id,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&thread).await?;
        Ok(thread)
    }

    pub async fn get(&self, thread_id: ObjectId) -> Result<Option<Thread>> {
        Ok(self.collection.find_one(doc! { "_id": thread_id }).await?)
    }

    /// Fetch a thread the caller owns, or fail.
    pub async fn get_owned(&self, thread_id: ObjectId, user: &UserInfo) -> Result<Thread> {
        let thread = self
            .get(thread_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_hex()))?;
        verify_owner(&thread, user)?;
        Ok(thread)
    }

    /// Most recently updated threads of one user, capped at 50.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Thread>> {
        let threads = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "updated_at": -1 })
            .limit(LIST_LIMIT)
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    /// Rename a thread the caller owns. Absent and foreign threads are
    /// indistinguishable to the caller.
    pub async fn rename(&self, thread_id: ObjectId, user: &UserInfo, title: &str) -> Result<Thread> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": thread_id, "user_id": user.resolved_id() },
                doc! { "$set": { "title": title, "updated_at": bson::DateTime::now() } },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_hex()))
    }

    /// Overwrite the title only while it is still a placeholder. Returns
    /// whether anything changed.
    pub async fn set_title_if_placeholder(&self, thread_id: ObjectId, title: &str) -> Result<bool> {
        let placeholders: Vec<&str> = TITLE_PLACEHOLDERS.to_vec();
        let result = self
            .collection
            .update_one(
                doc! { "_id": thread_id, "title": { "$in": placeholders } },
                doc! { "$set": { "title": title, "updated_at": bson::DateTime::now() } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    /// Delete a thread the caller owns. Checkpoints held by the engine's
    /// persistence layer are left behind as orphans.
    pub async fn remove(&self, thread_id: ObjectId, user: &UserInfo) -> Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": thread_id, "user_id": user.resolved_id() })
            .await?;

        if result.deleted_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_hex()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserInfo {
        UserInfo {
            user_id: id.to_string(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
        }
    }

    fn thread_owned_by(owner: &str) -> Thread {
        let now = Utc::now();
        Thread {
            id: ObjectId::new(),
            user_id: owner.to_string(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
            title: "New thread".to_string(),
            agent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn derive_title_uses_placeholder_for_blank_seed() {
        assert_eq!(derive_title(""), "New thread");
        assert_eq!(derive_title("   "), "New thread");
    }

    #[test]
    fn derive_title_caps_at_100_chars() {
        let seed = "x".repeat(300);
        assert_eq!(derive_title(&seed).chars().count(), 100);
        assert_eq!(derive_title("short question"), "short question");
    }

    #[test]
    fn owner_check_rejects_other_users() {
        let thread = thread_owned_by("u-1");
        assert!(verify_owner(&thread, &user("u-1")).is_ok());
        assert!(matches!(
            verify_owner(&thread, &user("u-2")),
            Err(PersistError::Unauthorized(_))
        ));
    }

    #[test]
    fn owner_check_uses_email_fallback() {
        let thread = thread_owned_by("ada@example.com");
        let caller = UserInfo {
            user_id: String::new(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
        };
        assert!(verify_owner(&thread, &caller).is_ok());
    }
}
