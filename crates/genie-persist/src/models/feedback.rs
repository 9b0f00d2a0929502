use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackValue {
    Like,
    Dislike,
}

/// Like/dislike judgement on one AI message, at most one per
/// (message, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFeedback {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub message_id: String,
    pub thread_id: String,
    pub user_id: String,
    pub feedback: FeedbackValue,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
