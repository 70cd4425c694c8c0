//! Sub-flow handlers. Each owns a slice of the conversation state machine.

pub(crate) mod booking;
pub(crate) mod cancel;
pub(crate) mod identity;
pub(crate) mod inquiry;
pub(crate) mod issuance;
pub(crate) mod modify;
pub(crate) mod resolution;
pub(crate) mod selection;

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use govdesk_core::directory::{STATUS_UPCOMING, UpcomingAppointment};
use govdesk_core::error::codes;
use govdesk_core::turn::{ReplyStage, TurnResponse};

use crate::collaborators::{Directory, IntentClassifier};
use crate::config::EngineConfig;
use crate::context::ConversationContext;
use crate::interrupt::InterruptProbe;
use crate::parsers::normalize_digits;
use crate::semantic::SemanticResolver;
use crate::vocabulary::Vocabulary;

/// Result of offering a turn to one handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Handled(TurnResponse),
    /// Not for this handler; the next one in line gets the turn
    Pass,
}

pub(crate) struct Collaborators {
    pub classifier: Arc<dyn IntentClassifier>,
    pub resolver: SemanticResolver,
    pub directory: Arc<dyn Directory>,
}

/// Everything a handler may read during one turn.
pub(crate) struct TurnEnv<'a> {
    pub config: &'a EngineConfig,
    pub vocabulary: &'a Vocabulary,
    pub collaborators: &'a Collaborators,
    pub now: DateTime<Utc>,
    pub text: &'a str,
}

impl TurnEnv<'_> {
    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.config.timezone).date_naive()
    }

    pub fn year(&self) -> i32 {
        self.today().year()
    }

    pub fn interrupt_probe(&self) -> InterruptProbe {
        InterruptProbe {
            year: self.year(),
            storage_offset_hours: self.config.storage_offset_hours,
        }
    }

    pub fn directory(&self) -> &dyn Directory {
        self.collaborators.directory.as_ref()
    }
}

/// Replies and remembers the message for "please repeat".
pub(crate) fn reply(
    ctx: &mut ConversationContext,
    stage: ReplyStage,
    message: impl Into<String>,
) -> Outcome {
    let message = message.into();
    ctx.last_bot_message = Some(message.clone());
    Outcome::Handled(TurnResponse::ok(stage, message))
}

/// Business-rule refusal: `ok = false`, the user sees `message`.
pub(crate) fn refuse(
    ctx: &mut ConversationContext,
    stage: ReplyStage,
    message: impl Into<String>,
) -> Outcome {
    let message = message.into();
    ctx.last_bot_message = Some(message.clone());
    Outcome::Handled(TurnResponse::refused(stage, message, codes::BUSINESS_RULE))
}

/// Appointments that can still be modified or cancelled.
pub(crate) fn still_upcoming(appointments: Vec<UpcomingAppointment>) -> Vec<UpcomingAppointment> {
    appointments
        .into_iter()
        .filter(|a| a.status == STATUS_UPCOMING)
        .collect()
}

const FUZZY_NAME_THRESHOLD: f64 = 0.8;

/// Picks an appointment from a listed set by 1-based index, then by service
/// name containment, then by close spelling of the service name.
pub(crate) fn pick_appointment<'a>(
    text: &str,
    appointments: &'a [UpcomingAppointment],
) -> Option<&'a UpcomingAppointment> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(index) = first_number(trimmed) {
        return index
            .checked_sub(1)
            .and_then(|i| appointments.get(i));
    }

    if let Some(found) = appointments.iter().find(|a| {
        let name = a.service.canonical_name.as_str();
        !name.is_empty() && (name.contains(trimmed) || trimmed.contains(name))
    }) {
        return Some(found);
    }

    appointments
        .iter()
        .map(|a| (a, strsim::jaro_winkler(&a.service.canonical_name, trimmed)))
        .filter(|(_, score)| *score >= FUZZY_NAME_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(a, _)| a)
}

fn first_number(text: &str) -> Option<usize> {
    let normalized = normalize_digits(text);
    let digits: String = normalized
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
