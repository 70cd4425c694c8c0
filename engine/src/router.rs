//! Per-turn dispatch: the first route that claims and handles the turn wins.

use govdesk_core::turn::{ReplyStage, TurnResponse};
use tracing::debug;

use crate::context::ConversationContext;
use crate::error::EngineError;
use crate::flows::{
    Outcome, TurnEnv, booking, cancel, identity, inquiry, issuance, modify, reply, resolution,
    selection,
};
use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Repeat,
    IdentityIssuance,
    Modify,
    Cancel,
    Identity,
    BookingSteps,
    ServiceSelection,
    Inquiry,
    BookingConfirmation,
    GuardRails,
    ClassifierFallback,
    GenericFallback,
}

/// Strict priority order.
pub const DISPATCH_ORDER: [Route; 12] = [
    Route::Repeat,
    Route::IdentityIssuance,
    Route::Modify,
    Route::Cancel,
    Route::Identity,
    Route::BookingSteps,
    Route::ServiceSelection,
    Route::Inquiry,
    Route::BookingConfirmation,
    Route::GuardRails,
    Route::ClassifierFallback,
    Route::GenericFallback,
];

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Repeat => "repeat",
            Route::IdentityIssuance => "identity_issuance",
            Route::Modify => "modify",
            Route::Cancel => "cancel",
            Route::Identity => "identity",
            Route::BookingSteps => "booking_steps",
            Route::ServiceSelection => "service_selection",
            Route::Inquiry => "inquiry",
            Route::BookingConfirmation => "booking_confirmation",
            Route::GuardRails => "guard_rails",
            Route::ClassifierFallback => "classifier_fallback",
            Route::GenericFallback => "generic_fallback",
        }
    }

    fn claims(self, env: &TurnEnv<'_>, ctx: &ConversationContext) -> bool {
        match self {
            Route::Repeat => env.vocabulary.repeat.matches(env.text),
            Route::IdentityIssuance => issuance::claims(ctx),
            Route::Modify => modify::claims(ctx),
            Route::Cancel => cancel::claims(ctx),
            Route::Identity => identity::claims(ctx, env.text),
            Route::BookingSteps => booking::claims(ctx),
            Route::ServiceSelection => selection::claims(env, ctx),
            Route::Inquiry => inquiry::claims(ctx),
            Route::BookingConfirmation => inquiry::confirmation_claims(ctx),
            Route::GuardRails => inquiry::guard_claims(ctx),
            Route::ClassifierFallback | Route::GenericFallback => true,
        }
    }

    async fn run(
        self,
        env: &TurnEnv<'_>,
        ctx: &mut ConversationContext,
    ) -> Result<Outcome, EngineError> {
        match self {
            Route::Repeat => Ok(repeat(ctx)),
            Route::IdentityIssuance => issuance::handle(env, ctx).await,
            Route::Modify => modify::handle(env, ctx).await,
            Route::Cancel => cancel::handle(env, ctx).await,
            Route::Identity => identity::handle(env, ctx).await,
            Route::BookingSteps => booking::handle(env, ctx).await,
            Route::ServiceSelection => selection::handle(env, ctx).await,
            Route::Inquiry => inquiry::handle(env, ctx).await,
            Route::BookingConfirmation => inquiry::handle_confirmation(env, ctx).await,
            Route::GuardRails => Ok(inquiry::guard(ctx)),
            Route::ClassifierFallback => resolution::classifier_fallback(env, ctx).await,
            Route::GenericFallback => {
                let stage = ctx.stage.reply();
                Ok(reply(ctx, stage, messages::GENERIC_FALLBACK))
            }
        }
    }
}

fn repeat(ctx: &mut ConversationContext) -> Outcome {
    let stage = ctx.stage.reply();
    match ctx.last_bot_message.clone() {
        Some(previous) => Outcome::Handled(TurnResponse::ok(stage, previous)),
        None => reply(ctx, stage, messages::REPEAT_WHAT),
    }
}

/// Offers the turn to each route in [`DISPATCH_ORDER`].
pub(crate) async fn dispatch(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<(Route, TurnResponse), EngineError> {
    for route in DISPATCH_ORDER {
        if !route.claims(env, ctx) {
            continue;
        }
        match route.run(env, ctx).await? {
            Outcome::Handled(response) => return Ok((route, response)),
            Outcome::Pass => debug!(route = route.as_str(), "route passed"),
        }
    }
    // The generic fallback always handles.
    Ok((
        Route::GenericFallback,
        TurnResponse::ok(ReplyStage::Service, messages::GENERIC_FALLBACK),
    ))
}
