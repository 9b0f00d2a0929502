use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use serde_json::Value;

use crate::error::Result;

/// Read-only view over the engine's checkpoint collection.
///
/// The collection and its document shape belong to the engine; we only ever
/// read the message list out of the latest checkpoint for a thread, and do
/// so leniently — anything that doesn't match yields an empty history rather
/// than an error. Thread deletion never touches this collection, so reads
/// against deleted threads simply find orphans or nothing.
#[derive(Clone)]
pub struct CheckpointReader {
    collection: Collection<Document>,
}

impl CheckpointReader {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("checkpoints");
        Self { collection }
    }

    /// Messages recorded in the most recent checkpoint of a thread.
    pub async fn latest_messages(&self, thread_id: &str) -> Result<Vec<Value>> {
        let checkpoint = self
            .collection
            .find_one(doc! { "thread_id": thread_id })
            .sort(doc! { "_id": -1 })
            .await?;

        let Some(checkpoint) = checkpoint else {
            return Ok(Vec::new());
        };

        let messages = checkpoint
            .get_document("checkpoint")
            .ok()
            .and_then(|cp| cp.get_document("channel_values").ok())
            .and_then(|cv| cv.get_array("messages").ok());

        let Some(messages) = messages else {
            return Ok(Vec::new());
        };

        Ok(messages
            .iter()
            .map(|bson| Value::from(bson.clone()))
            .collect())
    }
}
