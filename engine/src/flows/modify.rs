//! Rescheduling an existing appointment.

use chrono::NaiveDate;
use govdesk_core::turn::ReplyStage;
use tracing::{debug, info, warn};

use crate::context::{ConversationContext, Gate, Goal, ModifyStep, Stage, SubFlow};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, pick_appointment, refuse, reply, still_upcoming};
use crate::messages;
use crate::parsers::date::{iso_date, parse_day_month};
use crate::parsers::time::parse_time;

pub(crate) fn claims(ctx: &ConversationContext) -> bool {
    ctx.modify_step().is_some() && ctx.stage != Stage::Service && ctx.after_identity != Some(Goal::Book)
}

/// Lists the user's upcoming appointments, or asks them to verify first.
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
        ctx.after_identity = Some(Goal::Modify);
        return Ok(reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_MODIFY));
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
            let message = messages::single_appointment_to_modify(only, tz);
            ctx.flow = SubFlow::Modify(ModifyStep::WaitingNewDate {
                appointment_id: only.id.clone(),
            });
            ctx.appointments = upcoming;
            ctx.stage = Stage::Date;
            Ok(reply(ctx, ReplyStage::Date, message))
        }
        many => {
            let message = messages::choose_appointment_to_modify(many, tz);
            ctx.flow = SubFlow::Modify(ModifyStep::AskWhichAppointment);
            ctx.appointments = upcoming;
            ctx.stage = Stage::Date;
            Ok(reply(ctx, ReplyStage::Date, message))
        }
    }
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let Some(step) = ctx.modify_step().cloned() else {
        return Ok(Outcome::Pass);
    };

    match step {
        ModifyStep::AskWhichAppointment => {
            let Some(picked) = pick_appointment(env.text, &ctx.appointments) else {
                return Ok(reply(ctx, ReplyStage::Date, messages::APPOINTMENT_NOT_MATCHED));
            };
            ctx.flow = SubFlow::Modify(ModifyStep::WaitingNewDate {
                appointment_id: picked.id.clone(),
            });
            ctx.stage = Stage::Date;
            Ok(reply(ctx, ReplyStage::Date, messages::ASK_NEW_DATE))
        }
        ModifyStep::WaitingNewDate { appointment_id } => {
            let Some(date) = parse_day_month(env.text)
                .and_then(|dm| upcoming_date(dm.in_year(env.year()), dm.in_year(env.year() + 1), env.today()))
            else {
                return Ok(reply(ctx, ReplyStage::Date, messages::NEW_DATE_UNCLEAR));
            };
            debug!(%appointment_id, date = %iso_date(date), "new date accepted");
            ctx.flow = SubFlow::Modify(ModifyStep::WaitingNewTime {
                appointment_id,
                date,
            });
            ctx.stage = Stage::Time;
            Ok(reply(ctx, ReplyStage::Time, messages::ASK_NEW_TIME))
        }
        ModifyStep::WaitingNewTime {
            appointment_id,
            date,
        } => {
            let Some(time) = parse_time(env.text, env.config.storage_offset_hours) else {
                return Ok(reply(ctx, ReplyStage::Time, messages::NEW_TIME_UNCLEAR));
            };
            let at = date.and_time(time.stored).and_utc();
            if at < env.now {
                return Ok(refuse(ctx, ReplyStage::Time, messages::PAST_TIME));
            }
            let Some(token) = ctx.auth_token().map(str::to_string) else {
                ctx.flow = SubFlow::None;
                ctx.stage = Stage::Identity;
                ctx.after_identity = Some(Goal::Modify);
                return Ok(reply(ctx, ReplyStage::Identity, messages::VERIFY_TO_MODIFY));
            };

            let result = env
                .directory()
                .reschedule_appointment(&appointment_id, at, &token)
                .await;
            match result {
                Ok(()) => {
                    info!(
                        %appointment_id,
                        date = %iso_date(date),
                        stored = %time.stored_hhmm(),
                        "appointment rescheduled"
                    );
                    ctx.finish_booking();
                    Ok(reply(
                        ctx,
                        ReplyStage::Service,
                        messages::appointment_modified(date, &time.display),
                    ))
                }
                Err(err) if err.is_rejection() => {
                    warn!(%appointment_id, error = %err, "reschedule rejected by directory");
                    let message = err
                        .refusal_message()
                        .unwrap_or(messages::MODIFY_FAILED)
                        .to_string();
                    ctx.finish_booking();
                    Ok(refuse(ctx, ReplyStage::Service, message))
                }
                Err(err) => Err(err.into()),
            }
        }
    }
}

/// A day/month already gone this year means next year's.
fn upcoming_date(
    this_year: Option<NaiveDate>,
    next_year: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => next_year,
    }
}
