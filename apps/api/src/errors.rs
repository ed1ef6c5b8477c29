use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::RunError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The run exists but is in the wrong state for the request.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NotFound(_) => AppError::NotFound(err.to_string()),
            RunError::NotReady(_) | RunError::Failed(_) | RunError::Cancelled => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::{RunFailure, RunStatus};
    use crate::pipeline::stage::StageKind;

    #[test]
    fn test_run_errors_map_to_status_codes() {
        let id = Uuid::new_v4();
        let cases = [
            (RunError::NotFound(id), StatusCode::NOT_FOUND),
            (RunError::NotReady(RunStatus::Running), StatusCode::CONFLICT),
            (RunError::Cancelled, StatusCode::CONFLICT),
            (
                RunError::Failed(RunFailure {
                    stage: StageKind::Searcher,
                    message: "no job board succeeded".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = AppError::from(anyhow::anyhow!("secret connection string"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
