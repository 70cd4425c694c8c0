//! Cancelling an existing appointment.

use govdesk_core::turn::ReplyStage;
use tracing::{info, warn};

use crate::context::{CancelStep, ConversationContext, Gate, Goal, Stage, SubFlow};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, pick_appointment, refuse, reply, still_upcoming};
use crate::messages;
use crate::parsers::confirm::Confirmation;

pub(crate) fn claims(ctx: &ConversationContext) -> bool {
    ctx.cancel_step().is_some()
}

pub(crate) async fn start(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    ctx.service = None;
    ctx.service_alternatives.clear();
    ctx.gate = Gate::Idle;
    ctx.booking = Default::default();

    let Some(token) = ctx.auth_token().map(str::to_string) else {
        ctx.flow = SubFlow::None;
        ctx.stage = Stage::Identity;
        ctx.after_identity = Some(Goal::Cancel);
        return Ok(reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_CANCEL));
    };

    let upcoming = still_upcoming(env.directory().upcoming_appointments(&token).await?);
    let tz = env.config.timezone;
    match upcoming.as_slice() {
        [] => {
            ctx.flow = SubFlow::None;
            ctx.appointments.clear();
            ctx.stage = Stage::Service;
            Ok(reply(ctx, ReplyStage::Service, messages::NO_UPCOMING))
        }
        [only] => {
            let message = messages::confirm_cancel(only, tz);
            ctx.flow = SubFlow::Cancel(CancelStep::ConfirmCancel {
                appointment_id: only.id.clone(),
            });
            ctx.appointments = upcoming;
            ctx.stage = Stage::Confirm;
            Ok(reply(ctx, ReplyStage::Confirm, message))
        }
        many => {
            let message = messages::choose_appointment_to_cancel(many, tz);
            ctx.flow = SubFlow::Cancel(CancelStep::AskWhichAppointment);
            ctx.appointments = upcoming;
            ctx.stage = Stage::Service;
            Ok(reply(ctx, ReplyStage::Service, message))
        }
    }
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let Some(step) = ctx.cancel_step().cloned() else {
        return Ok(Outcome::Pass);
    };

    match step {
        CancelStep::AskWhichAppointment => {
            let Some(picked) = pick_appointment(env.text, &ctx.appointments) else {
                return Ok(reply(ctx, ReplyStage::Service, messages::APPOINTMENT_NOT_MATCHED));
            };
            let message = messages::confirm_cancel(picked, env.config.timezone);
            ctx.flow = SubFlow::Cancel(CancelStep::ConfirmCancel {
                appointment_id: picked.id.clone(),
            });
            ctx.stage = Stage::Confirm;
            Ok(reply(ctx, ReplyStage::Confirm, message))
        }
        CancelStep::ConfirmCancel { appointment_id } => {
            match env.vocabulary.cancel_confirmation.classify(env.text) {
                None => Ok(reply(ctx, ReplyStage::Confirm, messages::CANCEL_RETRY)),
                Some(Confirmation::No) => {
                    ctx.finish_booking();
                    Ok(reply(ctx, ReplyStage::Service, messages::CANCEL_KEPT))
                }
                Some(Confirmation::Yes) => {
                    let Some(token) = ctx.auth_token().map(str::to_string) else {
                        ctx.flow = SubFlow::None;
                        ctx.stage = Stage::Identity;
                        ctx.after_identity = Some(Goal::Cancel);
                        return Ok(reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_CANCEL));
                    };
                    match env.directory().cancel_appointment(&appointment_id, &token).await {
                        Ok(()) => {
                            info!(%appointment_id, "appointment cancelled");
                            ctx.finish_booking();
                            Ok(reply(ctx, ReplyStage::Service, messages::CANCEL_DONE))
                        }
                        Err(err) if err.is_rejection() => {
                            warn!(%appointment_id, error = %err, "cancellation rejected by directory");
                            let message = err
                                .refusal_message()
                                .unwrap_or(messages::CANCEL_FAILED)
                                .to_string();
                            ctx.finish_booking();
                            Ok(refuse(ctx, ReplyStage::Service, message))
                        }
                        Err(err) => Err(err.into()),
                    }
                }
            }
        }
    }
}
