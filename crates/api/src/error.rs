use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobscope_core::error::CoreError;
use jobscope_db::DbError;
use mongodb::error::ErrorKind;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the database-layer errors,
/// and implements [`IntoResponse`] to produce consistent JSON error
/// responses. All failures are handled at the render-cycle boundary: a
/// handler that hits one of these skips its remaining panels and the
/// client retries on the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `jobscope_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Connection-handle error (not connected, or reset after failure).
    #[error(transparent)]
    Handle(#[from] DbError),

    /// A driver error from a query or connection attempt.
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::InvalidRange { .. } => {
                    (StatusCode::BAD_REQUEST, "INVALID_RANGE", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::CatalogLoad(msg) => {
                    tracing::error!(error = %msg, "Catalog error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        msg.clone(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Handle(DbError::NotConnected) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "NOT_CONNECTED",
                "Not connected to MongoDB. Connect before loading the dashboard."
                    .to_string(),
            ),
            AppError::Handle(DbError::Mongo(err)) | AppError::Mongo(err) => {
                classify_mongo_error(err)
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a driver error into an HTTP status, error code, and message.
///
/// - Server selection failures (unreachable within the timeout) map to 503
///   so the client shows the connection banner.
/// - Everything else is a query failure, surfaced verbatim with 500.
fn classify_mongo_error(err: &mongodb::error::Error) -> (StatusCode, &'static str, String) {
    match *err.kind {
        ErrorKind::ServerSelection { ref message, .. } => {
            tracing::error!(error = %message, "MongoDB unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "CONNECTION_ERROR",
                format!("Cannot connect to MongoDB: {message}"),
            )
        }
        _ => {
            tracing::error!(error = %err, "MongoDB query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "QUERY_FAILED",
                err.to_string(),
            )
        }
    }
}
