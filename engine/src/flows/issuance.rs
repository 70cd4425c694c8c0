//! "How do I get an identity card" decision tree.

use govdesk_core::turn::ReplyStage;
use tracing::{info, warn};

use crate::context::{ConversationContext, Gate, Goal, IssuanceStep, SelectedService, Stage, SubFlow};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, reply};
use crate::messages;
use crate::parsers::confirm::Confirmation;
use crate::parsers::issuance::{
    FIRST_TIME_SERVICE_ID, FIRST_TIME_SERVICE_NAME, IssuanceReason, detect_issuance_reason,
};

/// Claims turns while the issuance questions are open, except during
/// identity verification or a booking resumed right after it.
pub(crate) fn claims(ctx: &ConversationContext) -> bool {
    if ctx.issuance_step().is_none() || ctx.stage == Stage::Identity {
        return false;
    }
    !(ctx.after_identity == Some(Goal::Book) && ctx.is_authenticated())
}

/// Starts the questions, or resolves straight away when the request
/// already names the reason ("I lost my ID").
pub(crate) async fn enter(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    ctx.after_identity = None;
    ctx.service = None;
    ctx.gate = Gate::Idle;
    ctx.stage = Stage::Service;

    if let Some(reason) = detect_issuance_reason(env.text, env.vocabulary) {
        info!(?reason, "issuance reason given with the request");
        return resolve_reason(env, ctx, reason).await;
    }

    ctx.flow = SubFlow::IdentityIssuance(IssuanceStep::HasPreviousId);
    Ok(reply(ctx, ReplyStage::Service, messages::HAS_PREVIOUS_ID))
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    match ctx.issuance_step() {
        Some(IssuanceStep::HasPreviousId) => {
            match env.vocabulary.previous_id.classify(env.text) {
                None => Ok(reply(ctx, ReplyStage::Service, messages::HAS_PREVIOUS_ID_RETRY)),
                Some(Confirmation::No) => {
                    choose(
                        ctx,
                        SelectedService {
                            id: FIRST_TIME_SERVICE_ID.to_string(),
                            name: FIRST_TIME_SERVICE_NAME.to_string(),
                        },
                    );
                    Ok(reply(
                        ctx,
                        ReplyStage::Service,
                        messages::issuance_service_chosen(FIRST_TIME_SERVICE_NAME),
                    ))
                }
                Some(Confirmation::Yes) => match detect_issuance_reason(env.text, env.vocabulary) {
                    Some(reason) => resolve_reason(env, ctx, reason).await,
                    None => {
                        ctx.flow = SubFlow::IdentityIssuance(IssuanceStep::Reason);
                        Ok(reply(ctx, ReplyStage::Service, messages::ASK_ISSUANCE_REASON))
                    }
                },
            }
        }
        Some(IssuanceStep::Reason) => match detect_issuance_reason(env.text, env.vocabulary) {
            Some(reason) => resolve_reason(env, ctx, reason).await,
            None => Ok(reply(ctx, ReplyStage::Service, messages::ISSUANCE_REASON_RETRY)),
        },
        None => Ok(Outcome::Pass),
    }
}

async fn resolve_reason(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
    reason: IssuanceReason,
) -> Result<Outcome, EngineError> {
    let service_id = reason.service_id();
    let details = match env.directory().service_by_id(service_id).await {
        Ok(details) => details,
        Err(err) if err.is_rejection() => {
            warn!(service_id, error = %err, "issuance service lookup rejected");
            if ctx.issuance_step().is_none() {
                ctx.flow = SubFlow::IdentityIssuance(IssuanceStep::Reason);
            }
            return Ok(reply(ctx, ReplyStage::Service, messages::SERVICE_INFO_FAILED));
        }
        Err(err) => return Err(err.into()),
    };

    let message = messages::issuance_service_chosen(&details.canonical_name);
    choose(
        ctx,
        SelectedService {
            id: service_id.to_string(),
            name: details.canonical_name,
        },
    );
    Ok(reply(ctx, ReplyStage::Service, message))
}

fn choose(ctx: &mut ConversationContext, service: SelectedService) {
    ctx.flow = SubFlow::None;
    ctx.service = Some(service);
    ctx.gate = Gate::AwaitingInquiryType;
    ctx.stage = Stage::Service;
}
