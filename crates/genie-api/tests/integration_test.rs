use axum::response::IntoResponse;
use genie_api::error::ApiError;
use genie_persist::PersistError;

#[tokio::test]
async fn bad_request_maps_to_400() {
    let response = ApiError::BadRequest("Test error".to_string()).into_response();
    assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_identity_maps_to_401() {
    let response = ApiError::Unauthorized.into_response();
    assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn persist_errors_map_to_http_statuses() {
    let forbidden: ApiError = PersistError::Unauthorized("not yours".to_string()).into();
    assert_eq!(
        forbidden.into_response().status(),
        axum::http::StatusCode::FORBIDDEN
    );

    let not_found: ApiError = PersistError::ThreadNotFound("abc".to_string()).into();
    assert_eq!(
        not_found.into_response().status(),
        axum::http::StatusCode::NOT_FOUND
    );

    let invalid: ApiError = PersistError::Validation("name is required".to_string()).into();
    assert_eq!(
        invalid.into_response().status(),
        axum::http::StatusCode::BAD_REQUEST
    );
}
