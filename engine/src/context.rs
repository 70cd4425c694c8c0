//! Per-conversation state.
//!
//! Every sub-flow owns exactly one variant of [`SubFlow`] and the
//! inquiry/booking gates are one [`Gate`] value, so at most one of each can
//! be active at a time.

use chrono::{DateTime, NaiveDate, Utc};
use govdesk_core::directory::UpcomingAppointment;
use govdesk_core::turn::ReplyStage;

use crate::parsers::time::ParsedTime;
use crate::semantic::ScoredService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Service,
    ServiceClarification,
    Identity,
    Date,
    Time,
    Confirm,
}

impl Stage {
    pub fn reply(self) -> ReplyStage {
        match self {
            Stage::Service => ReplyStage::Service,
            Stage::ServiceClarification => ReplyStage::ServiceClarification,
            Stage::Identity => ReplyStage::Identity,
            Stage::Date => ReplyStage::Date,
            Stage::Time => ReplyStage::Time,
            Stage::Confirm => ReplyStage::Confirm,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.reply().as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedService {
    pub id: String,
    pub name: String,
}

impl From<&ScoredService> for SelectedService {
    fn from(scored: &ScoredService) -> Self {
        Self {
            id: scored.service_id.clone(),
            name: scored.canonical_name.clone(),
        }
    }
}

/// Where identity verification stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStep {
    AwaitId,
    AwaitPhone,
    AwaitOtp,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityProgress {
    pub national_id: Option<String>,
    pub phone_number: Option<String>,
    pub auth_token: Option<String>,
}

impl IdentityProgress {
    pub fn step(&self) -> IdentityStep {
        match (&self.national_id, &self.phone_number, &self.auth_token) {
            (_, _, Some(_)) => IdentityStep::Authenticated,
            (None, _, None) => IdentityStep::AwaitId,
            (Some(_), None, None) => IdentityStep::AwaitPhone,
            (Some(_), Some(_), None) => IdentityStep::AwaitOtp,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    pub date: Option<NaiveDate>,
    pub time: Option<ParsedTime>,
}

/// Mutually exclusive prompts guarding the SERVICE stage once a service is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gate {
    #[default]
    Idle,
    /// Asked "price or documents?"
    AwaitingInquiryType,
    /// Answered an inquiry and asked "shall I book it?"
    AwaitingBookingConfirm,
}

/// Goal to resume once identity verification completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Book,
    Modify,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyStep {
    AskWhichAppointment,
    WaitingNewDate { appointment_id: String },
    WaitingNewTime { appointment_id: String, date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelStep {
    AskWhichAppointment,
    ConfirmCancel { appointment_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceStep {
    HasPreviousId,
    Reason,
}

/// The nested sub-flow currently in progress, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubFlow {
    #[default]
    None,
    Modify(ModifyStep),
    Cancel(CancelStep),
    IdentityIssuance(IssuanceStep),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    pub stage: Stage,
    pub service: Option<SelectedService>,
    /// Candidates listed while the stage is SERVICE_CLARIFICATION
    pub service_alternatives: Vec<ScoredService>,
    pub identity: IdentityProgress,
    pub booking: BookingDraft,
    pub gate: Gate,
    pub after_identity: Option<Goal>,
    pub flow: SubFlow,
    /// Appointments listed for the user to pick from
    pub appointments: Vec<UpcomingAppointment>,
    pub last_bot_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            stage: Stage::Service,
            service: None,
            service_alternatives: Vec::new(),
            identity: IdentityProgress::default(),
            booking: BookingDraft::default(),
            gate: Gate::Idle,
            after_identity: None,
            flow: SubFlow::None,
            appointments: Vec::new(),
            last_bot_message: None,
            updated_at: now,
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.identity.auth_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.auth_token.is_some()
    }

    pub fn service_name(&self) -> &str {
        self.service.as_ref().map(|s| s.name.as_str()).unwrap_or_default()
    }

    /// Picking which service to book: resuming a booking goal, or
    /// authenticated with nothing else open.
    pub fn awaiting_service_choice(&self) -> bool {
        self.stage == Stage::Service
            && self.service.is_none()
            && (self.after_identity == Some(Goal::Book)
                || (self.is_authenticated() && self.gate == Gate::Idle))
    }

    /// Drops everything a completed booking used. Identity survives.
    pub fn finish_booking(&mut self) {
        self.stage = Stage::Service;
        self.service = None;
        self.service_alternatives.clear();
        self.booking = BookingDraft::default();
        self.gate = Gate::Idle;
        self.after_identity = None;
        self.flow = SubFlow::None;
        self.appointments.clear();
    }

    pub fn modify_step(&self) -> Option<&ModifyStep> {
        match &self.flow {
            SubFlow::Modify(step) => Some(step),
            _ => None,
        }
    }

    pub fn cancel_step(&self) -> Option<&CancelStep> {
        match &self.flow {
            SubFlow::Cancel(step) => Some(step),
            _ => None,
        }
    }

    pub fn issuance_step(&self) -> Option<IssuanceStep> {
        match self.flow {
            SubFlow::IdentityIssuance(step) => Some(step),
            _ => None,
        }
    }
}
