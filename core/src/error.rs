use serde::Serialize;
use utoipa::ToSchema;

/// Structured error body for transport-level failures.
///
/// Conversational outcomes never use this shape; they are always a
/// [`crate::turn::TurnResponse`], even when the turn was refused.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "rate_limited")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for correlating with server logs
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API and in `TurnResponse::error`
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const COLLABORATOR_UNAVAILABLE: &str = "collaborator_unavailable";
    pub const BUSINESS_RULE: &str = "business_rule";
}
