use axum::extract::{Path, State};
use axum::Json;
use genie_graph::classify_history_message;
use genie_types::ChatMessage;
use mongodb::bson::oid::ObjectId;
use std::collections::HashSet;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Reconstruct the normalized message sequence of a thread from the engine's
/// persisted checkpoint.
///
/// The same logical message can appear fragmented across checkpoint entries,
/// so this consumer deduplicates by message id — the live pipeline
/// deliberately does not.
pub async fn get_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let object_id = ObjectId::parse_str(&thread_id)
        .map_err(|_| ApiError::BadRequest("Invalid thread ID format".to_string()))?;

    // An absent thread yields an empty history; a foreign one is rejected.
    let Some(thread) = state.persist.threads().get(object_id).await? else {
        return Ok(Json(Vec::new()));
    };
    if !thread.user_id.is_empty() && thread.user_id != user.resolved_id() {
        return Err(ApiError::Forbidden(
            "Thread belongs to another user".to_string(),
        ));
    }

    let raw_messages = state.persist.checkpoints().latest_messages(&thread_id).await?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut messages = Vec::new();
    for raw in &raw_messages {
        if let Some(message) = classify_history_message(raw) {
            if seen.insert(message.id().to_string()) {
                messages.push(message);
            }
        }
    }

    Ok(Json(messages))
}
