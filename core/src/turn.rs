use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sender used when a turn arrives without an explicit `senderId`.
pub const DEFAULT_SENDER_ID: &str = "default-user";

/// One user utterance addressed to the decision engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Conversation owner. Contexts are keyed by this value.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Raw transcript or chat text
    #[serde(default)]
    pub text: Option<String>,
}

/// Stage reported back to the caller after a turn.
///
/// Mirrors the conversation stage, plus `Done` which is only ever
/// reported (never stored) once an appointment has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStage {
    Service,
    ServiceClarification,
    Identity,
    Date,
    Time,
    Confirm,
    Done,
}

impl ReplyStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyStage::Service => "SERVICE",
            ReplyStage::ServiceClarification => "SERVICE_CLARIFICATION",
            ReplyStage::Identity => "IDENTITY",
            ReplyStage::Date => "DATE",
            ReplyStage::Time => "TIME",
            ReplyStage::Confirm => "CONFIRM",
            ReplyStage::Done => "DONE",
        }
    }
}

/// The single response payload of a turn: `{ok, stage, message, [error]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TurnResponse {
    /// False for refusals, collaborator failures, and internal errors
    pub ok: bool,
    pub stage: ReplyStage,
    /// Text to speak or display to the user
    pub message: String,
    /// Machine-readable reason when `ok` is false (see `error::codes`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnResponse {
    pub fn ok(stage: ReplyStage, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            stage,
            message: message.into(),
            error: None,
        }
    }

    pub fn refused(stage: ReplyStage, message: impl Into<String>, code: &str) -> Self {
        Self {
            ok: false,
            stage,
            message: message.into(),
            error: Some(code.to_string()),
        }
    }
}
