//! Price / documents questions about the selected service, and the
//! "shall I book it?" follow-up.

use govdesk_core::turn::ReplyStage;
use tracing::warn;

use crate::context::{ConversationContext, Gate, Goal, Stage};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, reply, selection};
use crate::messages;
use crate::parsers::confirm::{Confirmation, parse_confirmation};
use crate::parsers::inquiry::{InquiryType, parse_inquiry_type};

fn on_selected_service(ctx: &ConversationContext) -> bool {
    ctx.stage == Stage::Service && ctx.service.is_some()
}

pub(crate) fn claims(ctx: &ConversationContext) -> bool {
    on_selected_service(ctx) && ctx.gate == Gate::AwaitingInquiryType
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let Some(inquiry) = parse_inquiry_type(env.text, env.vocabulary) else {
        return Ok(reply(ctx, ReplyStage::Service, messages::INQUIRY_TYPE_RETRY));
    };
    let Some(service) = ctx.service.clone() else {
        return Ok(Outcome::Pass);
    };

    let details = match env.directory().service_by_id(&service.id).await {
        Ok(details) => details,
        Err(err) if err.is_rejection() => {
            warn!(service_id = %service.id, error = %err, "service details unavailable");
            return Ok(reply(ctx, ReplyStage::Service, messages::SERVICE_INFO_FAILED));
        }
        Err(err) => return Err(err.into()),
    };

    let message = match inquiry {
        InquiryType::Price => messages::price_answer(&details),
        InquiryType::Documents => messages::documents_answer(&details),
    };
    ctx.gate = Gate::AwaitingBookingConfirm;
    Ok(reply(ctx, ReplyStage::Service, message))
}

pub(crate) fn confirmation_claims(ctx: &ConversationContext) -> bool {
    on_selected_service(ctx) && ctx.gate == Gate::AwaitingBookingConfirm
}

/// Yes/no to "shall I book it?". Unclear answers pass to the guard rails.
pub(crate) async fn handle_confirmation(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    match parse_confirmation(env.text, env.vocabulary) {
        Some(Confirmation::Yes) => {
            ctx.gate = Gate::Idle;
            if !ctx.is_authenticated() {
                ctx.stage = Stage::Identity;
                ctx.after_identity = Some(Goal::Book);
                return Ok(reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_BOOK));
            }
            let Some(service) = ctx.service.clone() else {
                return Ok(Outcome::Pass);
            };
            selection::adopt_service(env, ctx, service).await
        }
        Some(Confirmation::No) => {
            ctx.gate = Gate::Idle;
            ctx.service = None;
            Ok(reply(ctx, ReplyStage::Service, messages::NO_MORE_QUESTIONS))
        }
        None => Ok(Outcome::Pass),
    }
}

pub(crate) fn guard_claims(ctx: &ConversationContext) -> bool {
    on_selected_service(ctx)
}

/// Re-asks the open question without calling anything.
pub(crate) fn guard(ctx: &mut ConversationContext) -> Outcome {
    match ctx.gate {
        Gate::AwaitingBookingConfirm => {
            reply(ctx, ReplyStage::Service, messages::BOOKING_CONFIRM_GUARD)
        }
        Gate::Idle | Gate::AwaitingInquiryType => {
            ctx.gate = Gate::AwaitingInquiryType;
            reply(ctx, ReplyStage::Service, messages::INQUIRY_TYPE_GUARD)
        }
    }
}
