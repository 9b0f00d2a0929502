use axum::extract::{Path, State};
use axum::Json;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn parse_id(id: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| ApiError::BadRequest("Invalid document ID format".to_string()))
}

/// Metadata and extracted content of one upload. The extraction itself runs
/// in an external service; by the time records land here they are plain text
/// or base64 image data.
pub async fn get_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let document = state.persist.documents().get_owned(parse_id(&id)?, &user).await?;

    Ok(Json(json!({
        "id": document.id.to_hex(),
        "name": document.name,
        "type": document.mime_type,
        "size": document.size,
        "status": document.status,
        "contentPreview": document.content_preview,
        "fullTextContent": document.full_text_content,
        "createdAt": document.created_at.to_rfc3339(),
        "updatedAt": document.updated_at.to_rfc3339(),
    })))
}

pub async fn delete_document(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.persist.documents().delete(parse_id(&id)?, &user).await?;
    Ok(Json(json!({ "success": true })))
}
