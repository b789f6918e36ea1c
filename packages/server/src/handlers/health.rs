use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::models::health::HealthResponse;

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Service health check",
    description = "Unauthenticated liveness probe. Responses are never cached.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
)]
pub async fn health() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            author: env!("CARGO_PKG_AUTHORS"),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
        }),
    )
}

/// Router fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("route not found".into())
}
