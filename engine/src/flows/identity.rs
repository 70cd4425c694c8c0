//! Identity verification: national id, phone, one-time code.

use govdesk_core::turn::ReplyStage;
use tracing::{info, warn};

use crate::context::{ConversationContext, Goal, IdentityStep, Stage};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, cancel, modify, refuse, reply, selection};
use crate::messages;
use crate::parsers::digits_only;

pub const MIN_NATIONAL_ID_DIGITS: usize = 8;
pub const MIN_PHONE_DIGITS: usize = 9;

/// Text that could only be a national id number.
pub(crate) fn looks_like_national_id(text: &str) -> bool {
    digits_only(text).len() >= MIN_NATIONAL_ID_DIGITS
}

/// Claims the turn at the IDENTITY stage, or when an id number arrives
/// while a goal waits for verification.
pub(crate) fn claims(ctx: &ConversationContext, text: &str) -> bool {
    if ctx.stage == Stage::Identity {
        return true;
    }
    ctx.after_identity.is_some()
        && !ctx.is_authenticated()
        && ctx.identity.national_id.is_none()
        && looks_like_national_id(text)
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    ctx.stage = Stage::Identity;

    match ctx.identity.step() {
        IdentityStep::AwaitId => {
            let national_id = digits_only(env.text);
            if national_id.len() < MIN_NATIONAL_ID_DIGITS {
                return Ok(reply(ctx, ReplyStage::Identity, messages::INVALID_NATIONAL_ID));
            }
            ctx.identity.national_id = Some(national_id);
            Ok(reply(ctx, ReplyStage::Identity, messages::ASK_PHONE))
        }
        IdentityStep::AwaitPhone => {
            let phone_number = digits_only(env.text);
            if phone_number.len() < MIN_PHONE_DIGITS {
                return Ok(reply(ctx, ReplyStage::Identity, messages::INVALID_PHONE));
            }
            let national_id = ctx.identity.national_id.clone().unwrap_or_default();
            match env.directory().request_otp(&national_id, &phone_number).await {
                Ok(()) => {
                    ctx.identity.phone_number = Some(phone_number);
                    Ok(reply(ctx, ReplyStage::Identity, messages::OTP_SENT))
                }
                Err(err) if err.is_rejection() => {
                    // Unknown id/phone pair: start over from the id.
                    warn!(error = %err, "otp request rejected");
                    let message = err
                        .refusal_message()
                        .unwrap_or(messages::INVALID_NATIONAL_ID)
                        .to_string();
                    ctx.identity.national_id = None;
                    ctx.identity.phone_number = None;
                    Ok(refuse(ctx, ReplyStage::Identity, message))
                }
                Err(err) => Err(err.into()),
            }
        }
        IdentityStep::AwaitOtp => {
            let phone_number = ctx.identity.phone_number.clone().unwrap_or_default();
            let code = match digits_only(env.text) {
                digits if !digits.is_empty() => digits,
                _ => env.text.trim().to_string(),
            };
            match env.directory().verify_otp(&phone_number, &code).await {
                Ok(token) => {
                    info!("identity verified");
                    ctx.identity.auth_token = Some(token);
                    resume(env, ctx).await
                }
                Err(err) if err.is_rejection() => {
                    Ok(reply(ctx, ReplyStage::Identity, messages::WRONG_OTP))
                }
                Err(err) => Err(err.into()),
            }
        }
        IdentityStep::Authenticated => resume(env, ctx).await,
    }
}

/// Continues whatever goal sent the user through verification.
async fn resume(env: &TurnEnv<'_>, ctx: &mut ConversationContext) -> Result<Outcome, EngineError> {
    match ctx.after_identity {
        Some(Goal::Book) => match ctx.service.clone() {
            Some(service) => selection::adopt_service(env, ctx, service).await,
            None => {
                ctx.stage = Stage::Service;
                Ok(reply(ctx, ReplyStage::Service, messages::WHICH_SERVICE))
            }
        },
        Some(Goal::Modify) => {
            ctx.after_identity = None;
            modify::start(env, ctx).await
        }
        Some(Goal::Cancel) => {
            ctx.after_identity = None;
            cancel::start(env, ctx).await
        }
        None => {
            ctx.stage = Stage::Service;
            Ok(reply(ctx, ReplyStage::Service, messages::HOW_CAN_I_HELP))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn opportunistic_claim_needs_a_pending_goal_and_an_id() {
        let mut ctx = ConversationContext::new(Utc::now());
        assert!(!claims(&ctx, "123456789"));

        ctx.after_identity = Some(Goal::Book);
        assert!(claims(&ctx, "رقمي 123456789"));
        assert!(!claims(&ctx, "1234567"));

        ctx.identity.national_id = Some("123456789".into());
        assert!(!claims(&ctx, "0591234567"));

        ctx.stage = Stage::Identity;
        assert!(claims(&ctx, "anything"));
    }
}
