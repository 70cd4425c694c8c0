//! Free-text turns no structured flow claimed: classifier intents first,
//! then the rule-based decision over semantic results.

use govdesk_core::turn::ReplyStage;
use tracing::{debug, info};

use crate::context::{ConversationContext, Gate, SelectedService, Stage};
use crate::decision::{DecisionAction, INTENT_ASK_INFORMATION, action_for_intent, decide_next_action};
use crate::error::EngineError;
use crate::flows::{Outcome, TurnEnv, booking, cancel, issuance, modify, reply, selection};
use crate::messages;
use crate::semantic::{ScoredService, evaluate_acceptance};

/// The classifier never sees structured answers or service choices.
pub(crate) fn classifier_allowed(env: &TurnEnv<'_>, ctx: &ConversationContext) -> bool {
    if matches!(
        ctx.stage,
        Stage::Identity | Stage::Date | Stage::Time | Stage::Confirm
    ) {
        return false;
    }
    let mid_selection = ctx.stage == Stage::ServiceClarification || ctx.awaiting_service_choice();
    !mid_selection || env.vocabulary.flow_switch.matches(env.text)
}

pub(crate) async fn classifier_fallback(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let mut action = None;

    if classifier_allowed(env, ctx) {
        let intent = env.collaborators.classifier.parse(env.text).await?;
        info!(intent = %intent.name, confidence = intent.confidence, "classified intent");

        if intent.name == INTENT_ASK_INFORMATION
            && intent.confidence >= env.config.classifier_min_confidence
            && ctx.service.is_none()
        {
            return answer_information_request(env, ctx).await;
        }
        action = action_for_intent(&intent, env.config.classifier_min_confidence);
    }

    let action = match action {
        Some(action) => action,
        None => {
            let semantic = if ctx.stage == Stage::Service && ctx.service.is_none() {
                Some(search(env).await?)
            } else {
                None
            };
            decide_next_action(
                semantic.as_deref(),
                ctx.service.is_some(),
                &env.config.acceptance,
                env.vocabulary,
            )
        }
    };
    apply_action(env, ctx, action).await
}

/// Treats the text as a fresh service request and acts on the rule-based decision.
pub(crate) async fn resolve_semantically(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let results = search(env).await?;
    let action = decide_next_action(
        Some(&results),
        false,
        &env.config.acceptance,
        env.vocabulary,
    );
    apply_action(env, ctx, action).await
}

async fn search(env: &TurnEnv<'_>) -> Result<Vec<ScoredService>, EngineError> {
    Ok(env
        .collaborators
        .resolver
        .search(env.text, env.config.semantic_top_k)
        .await?)
}

async fn answer_information_request(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
) -> Result<Outcome, EngineError> {
    let results = search(env).await?;
    let acceptance = evaluate_acceptance(&results, &env.config.acceptance);
    if let Some(acceptance) = &acceptance {
        info!(
            top_score = acceptance.top_score,
            gap = ?acceptance.gap,
            accepted = acceptance.accepted,
            "semantic evaluation"
        );
    }
    let accepted = acceptance.as_ref().is_some_and(|a| a.accepted);
    let Some(top) = results.first().filter(|_| accepted) else {
        return Ok(reply(ctx, ReplyStage::Service, messages::SERVICE_NOT_FOUND));
    };

    if env.vocabulary.identity_document.matches(&top.canonical_name) {
        return issuance::enter(env, ctx).await;
    }

    let service = SelectedService::from(top);
    let message = messages::ask_inquiry_type(&service.name);
    ctx.stage = Stage::Service;
    ctx.service = Some(service);
    ctx.gate = Gate::AwaitingInquiryType;
    Ok(reply(ctx, ReplyStage::Service, message))
}

pub(crate) async fn apply_action(
    env: &TurnEnv<'_>,
    ctx: &mut ConversationContext,
    action: DecisionAction,
) -> Result<Outcome, EngineError> {
    debug!(action = action.label(), "rule-based decision");
    match action {
        DecisionAction::Proceed(Some(top)) => {
            selection::adopt_service(env, ctx, SelectedService::from(&top)).await
        }
        DecisionAction::Proceed(None) => match ctx.service.clone() {
            Some(service) if ctx.is_authenticated() => {
                selection::adopt_service(env, ctx, service).await
            }
            Some(service) => {
                ctx.stage = Stage::Service;
                ctx.gate = Gate::AwaitingInquiryType;
                Ok(reply(
                    ctx,
                    ReplyStage::Service,
                    messages::ask_inquiry_type(&service.name),
                ))
            }
            None => Ok(Outcome::Pass),
        },
        DecisionAction::AskServiceClarification(alternatives) if alternatives.is_empty() => {
            ctx.stage = Stage::Service;
            Ok(reply(ctx, ReplyStage::Service, messages::CLARIFY_ANY))
        }
        DecisionAction::AskServiceClarification(alternatives) => {
            let message = messages::clarify_services(&alternatives);
            ctx.stage = Stage::ServiceClarification;
            ctx.service_alternatives = alternatives;
            Ok(reply(ctx, ReplyStage::ServiceClarification, message))
        }
        DecisionAction::AskIdentityIssuanceQuestions => issuance::enter(env, ctx).await,
        DecisionAction::Book => Ok(booking::begin(ctx)),
        DecisionAction::Modify => modify::start(env, ctx).await,
        DecisionAction::Cancel => cancel::start(env, ctx).await,
        DecisionAction::Fallback => Ok(Outcome::Pass),
    }
}
