use axum::extract::{Query, State};
use axum::Json;
use genie_persist::FeedbackValue;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub thread_id: String,
}

/// All of the caller's feedback in a thread, as a message id -> value map.
pub async fn get_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<FeedbackQuery>,
) -> ApiResult<Json<Value>> {
    if query.thread_id.is_empty() {
        return Err(ApiError::BadRequest("threadId is required".to_string()));
    }

    let entries = state
        .persist
        .feedback()
        .list_for_thread(&query.thread_id, &user)
        .await?;

    let mut map = Map::new();
    for entry in entries {
        let value = match entry.feedback {
            FeedbackValue::Like => "like",
            FeedbackValue::Dislike => "dislike",
        };
        map.insert(entry.message_id, Value::String(value.to_string()));
    }

    Ok(Json(Value::Object(map)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFeedbackRequest {
    pub message_id: String,
    pub thread_id: String,
    pub feedback: String,
}

pub async fn save_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SaveFeedbackRequest>,
) -> ApiResult<Json<Value>> {
    if req.message_id.is_empty() || req.thread_id.is_empty() || req.feedback.is_empty() {
        return Err(ApiError::BadRequest(
            "messageId, threadId, and feedback are required".to_string(),
        ));
    }

    let value = match req.feedback.as_str() {
        "like" => FeedbackValue::Like,
        "dislike" => FeedbackValue::Dislike,
        _ => {
            return Err(ApiError::BadRequest(
                "feedback must be 'like' or 'dislike'".to_string(),
            ))
        }
    };

    let stored = state
        .persist
        .feedback()
        .upsert(&req.message_id, &req.thread_id, value, &user)
        .await?;

    Ok(Json(json!({
        "id": stored.id.to_hex(),
        "messageId": stored.message_id,
        "threadId": stored.thread_id,
        "feedback": req.feedback,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFeedbackRequest {
    pub message_id: String,
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<DeleteFeedbackRequest>,
) -> ApiResult<Json<Value>> {
    if req.message_id.is_empty() {
        return Err(ApiError::BadRequest("messageId is required".to_string()));
    }
    state.persist.feedback().delete(&req.message_id, &user).await?;
    Ok(Json(json!({ "success": true })))
}
