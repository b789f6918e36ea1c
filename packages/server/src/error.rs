use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fragments_core::FragmentError;
use fragments_core::storage::StorageError;
use serde::Serialize;

/// Error details carried inside the failure envelope.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `NOT_FOUND`, `TYPE_MISMATCH`, `UNSUPPORTED_MEDIA_TYPE`,
    /// `PAYLOAD_TOO_LARGE`, `CONVERSION_FAILED`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "fragment 3f1c... not found")]
    pub message: String,
}

/// Envelope returned by every endpoint on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "error")]
    pub status: &'static str,
    pub error: ErrorBody,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    NotFound(String),
    TypeMismatch(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    ConversionFailed(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::TypeMismatch(msg) => (StatusCode::BAD_REQUEST, "TYPE_MISMATCH", msg),
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg,
            ),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::ConversionFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CONVERSION_FAILED",
                msg,
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        (
            status,
            Json(ErrorResponse {
                status: "error",
                error,
            }),
        )
            .into_response()
    }
}

impl From<FragmentError> for AppError {
    fn from(err: FragmentError) -> Self {
        match err {
            FragmentError::Validation { .. } => AppError::Validation(err.to_string()),
            FragmentError::NotFound { .. } => AppError::NotFound(err.to_string()),
            FragmentError::TypeMismatch { .. } => AppError::TypeMismatch(err.to_string()),
            FragmentError::UnsupportedMediaType { .. } => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            FragmentError::Conversion { .. } => {
                tracing::warn!("Conversion failed: {err}");
                AppError::ConversionFailed(err.to_string())
            }
            FragmentError::Storage(StorageError::SizeLimitExceeded { .. }) => {
                AppError::PayloadTooLarge(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
