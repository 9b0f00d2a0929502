use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Request log line with method, path, status and latency.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis(),
    );

    response
}
