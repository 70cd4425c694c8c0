//! Choosing which service to book, including the clarification loop.

use govdesk_core::directory::STATUS_UPCOMING;
use govdesk_core::turn::ReplyStage;
use tracing::{debug, info};

use crate::context::{ConversationContext, Gate, SelectedService, Stage, SubFlow};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, issuance, refuse, reply, resolution};
use crate::messages;
use crate::parsers::normalize_digits;
use crate::semantic::{ScoredService, evaluate_acceptance};

/// Requests shorter than this are not worth a semantic search.
const MIN_REQUEST_CHARS: usize = 4;

/// Claims clarification answers, and service requests while the user is
/// picking a service to book (unless they name another flow).
pub(crate) fn claims(env: &TurnEnv<'_>, ctx: &ConversationContext) -> bool {
    if ctx.stage == Stage::ServiceClarification {
        return true;
    }
    ctx.awaiting_service_choice() && !env.vocabulary.flow_switch.matches(env.text)
}

pub(crate) async fn handle(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    if ctx.stage == Stage::ServiceClarification {
        return clarify(env, ctx).await;
    }

    if env.text.trim().chars().count() < MIN_REQUEST_CHARS {
        return Ok(reply(ctx, ReplyStage::Service, messages::WHICH_SERVICE_SHORT));
    }

    let results = env
        .collaborators
        .resolver
        .search(env.text, env.config.semantic_top_k)
        .await?;
    let Some(acceptance) = evaluate_acceptance(&results, &env.config.acceptance) else {
        debug!("no catalog service matched");
        return Ok(reply(ctx, ReplyStage::Service, messages::SERVICE_NOT_FOUND));
    };
    info!(
        top_score = acceptance.top_score,
        gap = ?acceptance.gap,
        meets_threshold = acceptance.meets_threshold,
        meets_fallback = acceptance.meets_fallback,
        accepted = acceptance.accepted,
        "semantic evaluation"
    );
    if !acceptance.accepted {
        return Ok(reply(ctx, ReplyStage::Service, messages::SERVICE_NOT_FOUND));
    }

    let top = &results[0];
    if env.vocabulary.identity_document.matches(&top.canonical_name) {
        return issuance::enter(env, ctx).await;
    }
    adopt_service(env, ctx, SelectedService::from(top)).await
}

/// Makes `service` the conversation's service.
///
/// Authenticated users go straight to DATE unless they already hold an
/// upcoming appointment for it. Everyone else is asked whether they want
/// the price or the documents first.
pub(crate) async fn adopt_service(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
    service: SelectedService,
) -> Result<Outcome, EngineError> {
    ctx.service_alternatives.clear();
    ctx.after_identity = None;
    ctx.flow = SubFlow::None;
    ctx.stage = Stage::Service;

    let Some(token) = ctx.auth_token().map(str::to_string) else {
        let message = messages::ask_inquiry_type(&service.name);
        ctx.service = Some(service);
        ctx.gate = Gate::AwaitingInquiryType;
        return Ok(reply(ctx, ReplyStage::Service, message));
    };

    let upcoming = env.directory().upcoming_appointments(&token).await?;
    let duplicate = upcoming
        .iter()
        .any(|a| a.service_id == service.id && a.status == STATUS_UPCOMING);
    if duplicate {
        info!(service_id = %service.id, "refusing duplicate booking");
        ctx.service = None;
        ctx.gate = Gate::Idle;
        return Ok(refuse(ctx, ReplyStage::Service, messages::DUPLICATE_BOOKING));
    }

    let message = messages::ask_date(&service.name);
    ctx.service = Some(service);
    ctx.gate = Gate::Idle;
    ctx.booking = Default::default();
    ctx.stage = Stage::Date;
    Ok(reply(ctx, ReplyStage::Date, message))
}

/// Answer to a numbered list of candidate services.
async fn clarify(env: &TurnEnv<'_>, ctx: &mut ConversationContext) -> Result<Outcome, EngineError> {
    let picked = pick_alternative(env.text, &ctx.service_alternatives).cloned();
    ctx.service_alternatives.clear();
    ctx.stage = Stage::Service;

    match picked {
        Some(choice) if env.vocabulary.identity_document.matches(&choice.canonical_name) => {
            issuance::enter(env, ctx).await
        }
        Some(choice) => adopt_service(env, ctx, SelectedService::from(&choice)).await,
        // Read anything else as a rephrased request.
        None => resolution::resolve_semantically(env, ctx).await,
    }
}

fn pick_alternative<'a>(text: &str, alternatives: &'a [ScoredService]) -> Option<&'a ScoredService> {
    let trimmed = normalize_digits(text.trim());
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| alternatives.get(i));
    }
    alternatives.iter().find(|s| {
        let name = s.canonical_name.as_str();
        !name.is_empty() && (name.contains(trimmed.as_str()) || trimmed.contains(name))
    })
}
