//! Rule-based next-action decision for turns no structured flow claimed.

use crate::collaborators::ClassifiedIntent;
use crate::config::AcceptancePolicy;
use crate::semantic::ScoredService;
use crate::vocabulary::Vocabulary;

pub const INTENT_ASK_INFORMATION: &str = "ask_information";
pub const INTENT_BOOK: &str = "book_appointment";
pub const INTENT_MODIFY: &str = "modify_appointment";
pub const INTENT_CANCEL: &str = "cancel_appointment";

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionAction {
    /// Continue with the selected service, or adopt the given top match
    Proceed(Option<ScoredService>),
    AskServiceClarification(Vec<ScoredService>),
    AskIdentityIssuanceQuestions,
    Book,
    Modify,
    Cancel,
    Fallback,
}

impl DecisionAction {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionAction::Proceed(_) => "proceed",
            DecisionAction::AskServiceClarification(_) => "ask_service_clarification",
            DecisionAction::AskIdentityIssuanceQuestions => "ask_identity_issuance_questions",
            DecisionAction::Book => "book",
            DecisionAction::Modify => "modify",
            DecisionAction::Cancel => "cancel",
            DecisionAction::Fallback => "fallback",
        }
    }
}

/// Decides from semantic results alone.
///
/// `semantic` is `None` when no search ran for this turn. The rules apply
/// in order: a selected service proceeds; an empty result asks for
/// clarification; an identity-document top match asks the issuance
/// questions; close top scores are ambiguous; a confident top match
/// proceeds; anything else asks for clarification.
pub fn decide_next_action(
    semantic: Option<&[ScoredService]>,
    service_selected: bool,
    policy: &AcceptancePolicy,
    vocabulary: &Vocabulary,
) -> DecisionAction {
    if service_selected {
        return DecisionAction::Proceed(None);
    }
    let Some(results) = semantic else {
        return DecisionAction::Fallback;
    };
    let Some(top) = results.first() else {
        return DecisionAction::AskServiceClarification(Vec::new());
    };

    if vocabulary.identity_document.matches(&top.canonical_name) {
        return DecisionAction::AskIdentityIssuanceQuestions;
    }

    let alternatives = || {
        results
            .iter()
            .take(policy.max_alternatives)
            .cloned()
            .collect::<Vec<_>>()
    };

    if let Some(second) = results.get(1) {
        if round_gap(top.score - second.score) < policy.min_gap {
            return DecisionAction::AskServiceClarification(alternatives());
        }
    }

    if top.score >= policy.threshold {
        return DecisionAction::Proceed(Some(top.clone()));
    }

    DecisionAction::AskServiceClarification(alternatives())
}

fn round_gap(gap: f64) -> f64 {
    (gap.abs() * 10_000.0).round() / 10_000.0
}

/// Maps a confident book/modify/cancel intent to its action.
pub fn action_for_intent(intent: &ClassifiedIntent, min_confidence: f64) -> Option<DecisionAction> {
    if intent.confidence < min_confidence {
        return None;
    }
    match intent.name.as_str() {
        INTENT_BOOK => Some(DecisionAction::Book),
        INTENT_MODIFY => Some(DecisionAction::Modify),
        INTENT_CANCEL => Some(DecisionAction::Cancel),
        _ => None,
    }
}
