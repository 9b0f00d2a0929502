use futures::TryStreamExt;
use genie_types::UserInfo;
use mongodb::bson::oid::ObjectId;
use mongodb::{bson::doc, Client, Collection};

use crate::error::{PersistError, Result};
use crate::models::DocumentRecord;

#[derive(Clone)]
pub struct DocumentRepository {
    collection: Collection<DocumentRecord>,
}

impl DocumentRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("documents");
        Self { collection }
    }

    pub async fn get_owned(&self, document_id: ObjectId, user: &UserInfo) -> Result<DocumentRecord> {
        let document = self
            .collection
            .find_one(doc! { "_id": document_id, "user_id": user.resolved_id() })
            .await?;
        document.ok_or_else(|| PersistError::NotFound(format!("Document {}", document_id.to_hex())))
    }

    /// Resolve the attachments referenced by a turn. Returned in id order;
    /// ids the caller does not own resolve to nothing.
    pub async fn find_many(&self, ids: &[ObjectId], user: &UserInfo) -> Result<Vec<DocumentRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let documents = self
            .collection
            .find(doc! {
                "_id": { "$in": ids.to_vec() },
                "user_id": user.resolved_id(),
            })
            .await?
            .try_collect()
            .await?;
        Ok(documents)
    }

    pub async fn delete(&self, document_id: ObjectId, user: &UserInfo) -> Result<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": document_id, "user_id": user.resolved_id() })
            .await?;

        if result.deleted_count == 0 {
            return Err(PersistError::NotFound(format!(
                "Document {}",
                document_id.to_hex()
            )));
        }
        Ok(())
    }
}
