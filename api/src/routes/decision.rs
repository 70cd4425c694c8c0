use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use govdesk_core::turn::{DEFAULT_SENDER_ID, TurnRequest, TurnResponse};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn turn_router() -> Router<AppState> {
    Router::new().route("/v1/decision/next", post(next_turn))
}

pub fn context_router() -> Router<AppState> {
    Router::new().route("/v1/decision/context/{sender_id}", delete(reset_context))
}

/// Advance a conversation by one utterance
///
/// Conversational refusals (past date, wrong code, duplicate booking,
/// directory outage) come back as 200 with `ok = false`.
#[utoipa::path(
    post,
    path = "/v1/decision/next",
    request_body = TurnRequest,
    responses(
        (status = 200, description = "Next assistant reply", body = TurnResponse),
        (status = 400, description = "Missing text or malformed body"),
        (status = 500, description = "The turn failed inside the engine", body = TurnResponse)
    ),
    tag = "decision"
)]
pub async fn next_turn(
    State(state): State<AppState>,
    AppJson(req): AppJson<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let text = req
        .text
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(AppError::MissingText)?;
    let sender_id = req
        .sender_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SENDER_ID.to_string());

    // A panicking turn must not take the connection down with it.
    let engine = state.engine.clone();
    let turn = tokio::spawn(async move { engine.next_turn(&sender_id, &text).await });

    match turn.await {
        Ok(reply) => Ok(Json(reply?)),
        Err(join_err) => Err(AppError::TurnFailed(format!("turn task aborted: {join_err}"))),
    }
}

/// Forget a sender's conversation
#[utoipa::path(
    delete,
    path = "/v1/decision/context/{sender_id}",
    params(("sender_id" = String, Path, description = "Conversation owner")),
    responses(
        (status = 204, description = "Conversation forgotten (or never existed)")
    ),
    tag = "decision"
)]
pub async fn reset_context(
    State(state): State<AppState>,
    Path(sender_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .engine
        .reset(&sender_id)
        .await
        .map_err(|err| AppError::Internal(err.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
