use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Saved text snippet a user can paste into a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    pub name: String,
    pub content: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
