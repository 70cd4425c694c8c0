use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use govdesk_core::error::{self, ApiError};
use govdesk_core::turn::{ReplyStage, TurnResponse};
use govdesk_engine::messages;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Malformed request body (400)
    Validation {
        message: String,
        field: Option<String>,
        docs_hint: Option<String>,
    },
    /// Turn request without usable text (400)
    MissingText,
    /// The turn itself failed inside the engine (500, Turn API body)
    TurnFailed(String),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::MissingText => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "ok": false, "error": "text is required" })),
                )
                    .into_response();
            }
            AppError::TurnFailed(msg) => {
                tracing::error!(request_id = %request_id, "Turn failed: {}", msg);
                let body = TurnResponse::refused(
                    ReplyStage::Service,
                    messages::INTERNAL_FAILURE,
                    error::codes::INTERNAL_ERROR,
                );
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<govdesk_engine::EngineError> for AppError {
    fn from(err: govdesk_engine::EngineError) -> Self {
        AppError::TurnFailed(err.to_string())
    }
}
