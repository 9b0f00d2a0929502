use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use genie_types::UserInfo;

use crate::error::ApiError;

/// Caller identity resolved from the headers the OAuth-terminating proxy
/// injects. Requests that reach this service without them are rejected; the
/// session subsystem itself lives upstream.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

fn header_value(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, "x-user-id");
        let user_email = header_value(parts, "x-user-email");
        let user_name = header_value(parts, "x-user-name");

        if user_id.is_empty() && user_email.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser(UserInfo {
            user_id,
            user_name: if user_name.is_empty() { "Unknown".to_string() } else { user_name },
            user_email: if user_email.is_empty() { "Unknown".to_string() } else { user_email },
        }))
    }
}
