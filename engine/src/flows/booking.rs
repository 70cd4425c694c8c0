//! DATE → TIME → CONFIRM for the selected service.

use govdesk_core::turn::ReplyStage;
use tracing::{debug, info, warn};

use crate::context::{BookingDraft, ConversationContext, Gate, Goal, Stage, SubFlow};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, refuse, reply};
use crate::interrupt::detect_interrupt;
use crate::messages;
use crate::parsers::confirm::{Confirmation, parse_confirmation};
use crate::parsers::date::{iso_date, parse_date};
use crate::parsers::time::parse_time;

pub(crate) fn claims(ctx: &ConversationContext) -> bool {
    ctx.is_authenticated()
        && ctx.service.is_some()
        && matches!(ctx.stage, Stage::Date | Stage::Time | Stage::Confirm)
}

/// Entry point for a BOOK action: verify first, then ask for the service.
pub(crate) fn begin(ctx: &mut ConversationContext) -> Outcome {
    ctx.flow = SubFlow::None;
    ctx.appointments.clear();
    if !ctx.is_authenticated() {
        ctx.stage = Stage::Identity;
        ctx.after_identity = Some(Goal::Book);
        return reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_BOOK);
    }
    ctx.stage = Stage::Service;
    ctx.service = None;
    ctx.gate = Gate::Idle;
    ctx.booking = BookingDraft::default();
    reply(ctx, ReplyStage::Service, messages::WHICH_SERVICE)
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    if let Some(reason) = detect_interrupt(ctx.stage, env.text, env.interrupt_probe(), env.vocabulary) {
        return Ok(interrupt(ctx, reason));
    }

    match ctx.stage {
        Stage::Date => Ok(on_date(env, ctx)),
        Stage::Time => Ok(on_time(env, ctx)),
        Stage::Confirm => on_confirm(env, ctx).await,
        _ => Ok(Outcome::Pass),
    }
}

fn interrupt(ctx: &mut ConversationContext, reason: crate::interrupt::InterruptReason) -> Outcome {
    let name = ctx.service_name().to_string();
    let message = match ctx.stage {
        Stage::Date => messages::interrupted_at_date(&name),
        Stage::Time => messages::interrupted_at_time(&name),
        _ => messages::interrupted_at_confirm(&name),
    };
    info!(from = ctx.stage.as_str(), ?reason, "booking step interrupted");
    ctx.stage = Stage::Service;
    ctx.gate = Gate::AwaitingInquiryType;
    ctx.booking = BookingDraft::default();
    reply(ctx, ReplyStage::Service, message)
}

fn on_date(env: &TurnEnv<'_>, ctx: &mut ConversationContext) -> Outcome {
    let Some(date) = parse_date(env.text, env.year()) else {
        let message = messages::ask_date(ctx.service_name());
        return reply(ctx, ReplyStage::Date, message);
    };
    if date < env.today() {
        return refuse(ctx, ReplyStage::Date, messages::PAST_DATE);
    }
    debug!(date = %iso_date(date), "booking date accepted");
    ctx.booking.date = Some(date);
    ctx.stage = Stage::Time;
    reply(ctx, ReplyStage::Time, messages::ASK_TIME)
}

fn on_time(env: &TurnEnv<'_>, ctx: &mut ConversationContext) -> Outcome {
    let Some(date) = ctx.booking.date else {
        ctx.stage = Stage::Date;
        let message = messages::ask_date(ctx.service_name());
        return reply(ctx, ReplyStage::Date, message);
    };
    let Some(time) = parse_time(env.text, env.config.storage_offset_hours) else {
        return reply(ctx, ReplyStage::Time, messages::TIME_RETRY);
    };
    if date.and_time(time.stored).and_utc() < env.now {
        return refuse(ctx, ReplyStage::Time, messages::PAST_TIME);
    }

    debug!(date = %iso_date(date), stored = %time.stored_hhmm(), "booking time accepted");
    let message = messages::confirm_booking(ctx.service_name(), date, &time.display);
    ctx.booking.time = Some(time);
    ctx.stage = Stage::Confirm;
    reply(ctx, ReplyStage::Confirm, message)
}

async fn on_confirm(env: &TurnEnv<'_>, ctx: &mut ConversationContext) -> Result<Outcome, EngineError> {
    match parse_confirmation(env.text, env.vocabulary) {
        Some(Confirmation::Yes) => {}
        Some(Confirmation::No) => {
            ctx.booking = BookingDraft::default();
            ctx.stage = Stage::Date;
            return Ok(reply(ctx, ReplyStage::Date, messages::DATE_AGAIN));
        }
        None => return Ok(reply(ctx, ReplyStage::Confirm, messages::CONFIRM_RETRY)),
    }

    let (Some(service), Some(date), Some(time), Some(token)) = (
        ctx.service.clone(),
        ctx.booking.date,
        ctx.booking.time.clone(),
        ctx.auth_token().map(str::to_string),
    ) else {
        ctx.booking = BookingDraft::default();
        ctx.stage = Stage::Date;
        return Ok(refuse(ctx, ReplyStage::Date, messages::BOOKING_INCOMPLETE));
    };

    let at = date.and_time(time.stored).and_utc();
    if at < env.now {
        ctx.booking = BookingDraft::default();
        ctx.stage = Stage::Date;
        return Ok(refuse(ctx, ReplyStage::Date, messages::PAST_AT_CONFIRM));
    }

    match env.directory().create_appointment(&service.id, at, &token).await {
        Ok(()) => {
            info!(service_id = %service.id, %at, "appointment created");
            ctx.finish_booking();
            Ok(reply(ctx, ReplyStage::Done, messages::BOOKING_DONE))
        }
        Err(err) if err.is_rejection() => {
            warn!(service_id = %service.id, error = %err, "appointment rejected by directory");
            let message = err
                .refusal_message()
                .unwrap_or(messages::BOOKING_INCOMPLETE)
                .to_string();
            ctx.finish_booking();
            Ok(refuse(ctx, ReplyStage::Service, message))
        }
        Err(err) => Err(err.into()),
    }
}
