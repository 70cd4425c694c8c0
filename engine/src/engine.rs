//! The turn-processing entry point.

use std::sync::Arc;

use chrono::Duration;
use govdesk_core::error::codes;
use govdesk_core::turn::TurnResponse;
use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::collaborators::{Directory, EmbeddingProvider, IntentClassifier, ServiceCatalog};
use crate::config::EngineConfig;
use crate::context::ConversationContext;
use crate::error::EngineError;
use crate::flows::{Collaborators, TurnEnv};
use crate::messages;
use crate::router;
use crate::semantic::SemanticResolver;
use crate::store::{ContextStore, InMemoryContextStore, SenderLocks};
use crate::vocabulary::Vocabulary;

/// Drives one conversation per sender id.
///
/// Each turn loads the sender's context, works on a copy, and writes the
/// copy back only when the turn succeeded. A collaborator failure leaves
/// the stored context untouched so the user can simply retry.
pub struct DecisionEngine {
    config: EngineConfig,
    vocabulary: Vocabulary,
    clock: Arc<dyn Clock>,
    store: Arc<dyn ContextStore>,
    locks: SenderLocks,
    collaborators: Collaborators,
}

pub struct DecisionEngineBuilder {
    config: EngineConfig,
    vocabulary: Vocabulary,
    clock: Arc<dyn Clock>,
    store: Arc<dyn ContextStore>,
    classifier: Arc<dyn IntentClassifier>,
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: Arc<dyn ServiceCatalog>,
    directory: Arc<dyn Directory>,
}

impl DecisionEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> DecisionEngine {
        DecisionEngine {
            config: self.config,
            vocabulary: self.vocabulary,
            clock: self.clock,
            store: self.store,
            locks: SenderLocks::new(),
            collaborators: Collaborators {
                classifier: self.classifier,
                resolver: SemanticResolver::new(self.embedder, self.catalog),
                directory: self.directory,
            },
        }
    }
}

impl DecisionEngine {
    /// Starts a builder with default config, vocabulary, system clock and an
    /// in-memory context store.
    pub fn builder(
        classifier: Arc<dyn IntentClassifier>,
        embedder: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn ServiceCatalog>,
        directory: Arc<dyn Directory>,
    ) -> DecisionEngineBuilder {
        DecisionEngineBuilder {
            config: EngineConfig::default(),
            vocabulary: Vocabulary::default(),
            clock: Arc::new(SystemClock),
            store: Arc::new(InMemoryContextStore::new()),
            classifier,
            embedder,
            catalog,
            directory,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes one utterance of `sender_id` and returns the reply.
    ///
    /// `Err` is reserved for engine-internal failures (e.g. the context
    /// store). Collaborator failures become an `ok = false` reply.
    pub async fn next_turn(&self, sender_id: &str, text: &str) -> Result<TurnResponse, EngineError> {
        let _turn = self.locks.acquire(sender_id).await;
        let now = self.clock.now();

        let stored = self.store.get(sender_id).await?;
        let mut ctx = stored
            .clone()
            .unwrap_or_else(|| ConversationContext::new(now));
        let from = ctx.stage;

        let env = TurnEnv {
            config: &self.config,
            vocabulary: &self.vocabulary,
            collaborators: &self.collaborators,
            now,
            text,
        };

        match router::dispatch(&env, &mut ctx).await {
            Ok((route, response)) => {
                info!(
                    sender_id,
                    route = route.as_str(),
                    from = from.as_str(),
                    stage = response.stage.as_str(),
                    ok = response.ok,
                    "turn handled"
                );
                ctx.updated_at = now;
                self.store.put(sender_id, ctx).await?;
                Ok(response)
            }
            Err(EngineError::Collaborator(err)) => {
                error!(sender_id, stage = from.as_str(), error = %err, "collaborator failed during turn");
                let stage = from.reply();
                Ok(match err.refusal_message() {
                    Some(refusal) => TurnResponse::refused(stage, refusal, codes::BUSINESS_RULE),
                    None => TurnResponse::refused(
                        stage,
                        messages::COLLABORATOR_APOLOGY,
                        codes::COLLABORATOR_UNAVAILABLE,
                    ),
                })
            }
            Err(err) => {
                error!(sender_id, error = %err, "turn failed");
                Err(err)
            }
        }
    }

    /// Forgets the sender's conversation. Returns whether one existed.
    pub async fn reset(&self, sender_id: &str) -> Result<bool, EngineError> {
        let _turn = self.locks.acquire(sender_id).await;
        let existed = self.store.delete(sender_id).await?;
        info!(sender_id, existed, "conversation reset");
        Ok(existed)
    }

    /// Drops contexts idle for longer than the configured TTL.
    pub async fn evict_idle(&self) -> Result<usize, EngineError> {
        let ttl = Duration::from_std(self.config.context_idle_ttl)
            .map_err(|err| EngineError::Internal(format!("invalid idle ttl: {err}")))?;
        let cutoff = self.clock.now() - ttl;
        let evicted = self.store.evict_idle(cutoff).await?;
        let pruned = self.locks.prune();
        if evicted > 0 || pruned > 0 {
            info!(evicted, pruned_locks = pruned, "idle conversations evicted");
        }
        Ok(evicted)
    }

    /// Current context of a sender, for inspection.
    pub async fn context(&self, sender_id: &str) -> Result<Option<ConversationContext>, EngineError> {
        self.store.get(sender_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use govdesk_core::turn::ReplyStage;

    use super::*;
    use crate::clock::FixedClock;
    use crate::context::{
        CancelStep, Gate, Goal, IssuanceStep, ModifyStep, SelectedService, Stage, SubFlow,
    };
    use crate::decision::{INTENT_ASK_INFORMATION, INTENT_CANCEL, INTENT_MODIFY};
    use crate::test_support::{FakeCatalog, FixedEmbeddings, RecordingDirectory, ScriptedClassifier};

    const SENDER: &str = "u-1";
    const TOKEN: &str = "tok-1";

    struct Harness {
        engine: DecisionEngine,
        store: Arc<InMemoryContextStore>,
        clock: Arc<FixedClock>,
        directory: Arc<RecordingDirectory>,
        classifier: Arc<ScriptedClassifier>,
    }

    /// 2026-10-16 09:00 in Jerusalem.
    fn today_morning() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap()
    }

    fn embeddings() -> FixedEmbeddings {
        FixedEmbeddings::new()
            .with("بطاقة هوية وجواز سفر", vec![1.0, 0.0, 0.0])
            .with("بدي جواز سفر", vec![0.95, 0.05, 0.0])
            .with("ضاعت هويتي بدي بدل فاقد", vec![0.95, 0.05, 0.0])
            .with("رخصة قيادة", vec![0.0, 1.0, 0.0])
            .with("بدي رخصة سواقة", vec![0.0, 0.98, 0.1])
            .with("تجديد رخصة قيادة", vec![0.0, 0.9, 0.4])
            .with("شي عن الرخصة", vec![0.0, 0.8, 0.2])
            .with("لا، بدي رخصة سواقة جديدة", vec![0.0, 1.0, 0.0])
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::new()
            .with_service("ID_CARD", "بطاقة هوية وجواز سفر", None)
            .with_service("LICENSE", "رخصة قيادة", None)
            .with_service("LICENSE_RENEW", "تجديد رخصة قيادة", None)
    }

    fn harness(classifier: ScriptedClassifier, directory: RecordingDirectory) -> Harness {
        let store = Arc::new(InMemoryContextStore::new());
        let clock = Arc::new(FixedClock::new(today_morning()));
        let directory = Arc::new(directory);
        let classifier = Arc::new(classifier);
        let engine = DecisionEngine::builder(
            classifier.clone(),
            Arc::new(embeddings()),
            Arc::new(catalog()),
            directory.clone(),
        )
        .clock(clock.clone())
        .store(store.clone())
        .build();
        Harness {
            engine,
            store,
            clock,
            directory,
            classifier,
        }
    }

    fn directory() -> RecordingDirectory {
        RecordingDirectory::new()
            .with_service("LICENSE", "رخصة قيادة", 150.0)
            .with_service("ISSUE_ID_LOST", "إصدار هوية بدل فاقد", 0.0)
            .with_user("123456789", "0591234567", "4321", TOKEN)
    }

    fn license() -> SelectedService {
        SelectedService {
            id: "LICENSE".into(),
            name: "رخصة قيادة".into(),
        }
    }

    async fn seed(h: &Harness, build: impl FnOnce(&mut ConversationContext)) {
        let mut ctx = ConversationContext::new(today_morning());
        build(&mut ctx);
        h.store.put(SENDER, ctx).await.unwrap();
    }

    async fn ctx(h: &Harness) -> ConversationContext {
        h.store.get(SENDER).await.unwrap().unwrap()
    }

    async fn say(h: &Harness, text: &str) -> TurnResponse {
        h.engine.next_turn(SENDER, text).await.unwrap()
    }

    #[tokio::test]
    async fn identity_document_request_opens_issuance_questions() {
        let h = harness(
            ScriptedClassifier::new().with("بدي جواز سفر", INTENT_ASK_INFORMATION, 0.93),
            directory(),
        );

        let resp = say(&h, "بدي جواز سفر").await;
        assert!(resp.ok);
        assert_eq!(resp.stage, ReplyStage::Service);
        assert_eq!(resp.message, messages::HAS_PREVIOUS_ID);

        let ctx = ctx(&h).await;
        assert_eq!(ctx.issuance_step(), Some(IssuanceStep::HasPreviousId));
        assert!(ctx.service.is_none());
    }

    #[tokio::test]
    async fn issuance_reason_in_the_request_skips_the_questions() {
        let h = harness(
            ScriptedClassifier::new().with("ضاعت هويتي بدي بدل فاقد", INTENT_ASK_INFORMATION, 0.9),
            directory(),
        );

        let resp = say(&h, "ضاعت هويتي بدي بدل فاقد").await;
        assert_eq!(resp.message, messages::issuance_service_chosen("إصدار هوية بدل فاقد"));
        let ctx = ctx(&h).await;
        assert_eq!(ctx.service.as_ref().map(|s| s.id.as_str()), Some("ISSUE_ID_LOST"));
        assert_eq!(ctx.gate, Gate::AwaitingInquiryType);
        assert_eq!(ctx.flow, SubFlow::None);
    }

    #[tokio::test]
    async fn first_time_issuance_goes_to_inquiry() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| ctx.flow = SubFlow::IdentityIssuance(IssuanceStep::HasPreviousId)).await;

        let resp = say(&h, "لا اول مرة").await;
        assert!(resp.message.contains("إصدار هوية لأول مرة"));
        let ctx = ctx(&h).await;
        assert_eq!(
            ctx.service.as_ref().map(|s| s.id.as_str()),
            Some("ISSUE_ID_FIRST_TIME")
        );
        assert_eq!(ctx.gate, Gate::AwaitingInquiryType);
    }

    #[tokio::test]
    async fn day_month_at_date_moves_to_time() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.identity.auth_token = Some(TOKEN.into());
            ctx.service = Some(license());
            ctx.stage = Stage::Date;
        })
        .await;

        let resp = say(&h, "28/12").await;
        assert!(resp.ok);
        assert_eq!(resp.stage, ReplyStage::Time);
        assert_eq!(ctx(&h).await.booking.date, NaiveDate::from_ymd_opt(2026, 12, 28));
        assert!(h.classifier.calls().is_empty());
    }

    #[tokio::test]
    async fn question_at_confirm_interrupts_the_booking() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.identity.auth_token = Some(TOKEN.into());
            ctx.service = Some(license());
            ctx.stage = Stage::Date;
        })
        .await;
        say(&h, "28/12").await;
        say(&h, "10:30").await;
        assert_eq!(ctx(&h).await.stage, Stage::Confirm);

        let resp = say(&h, "شو المستندات المطلوبة؟").await;
        assert_eq!(resp.stage, ReplyStage::Service);
        let ctx = ctx(&h).await;
        assert_eq!(ctx.stage, Stage::Service);
        assert_eq!(ctx.gate, Gate::AwaitingInquiryType);
        assert_eq!(ctx.booking, Default::default());
        assert!(h.directory.calls().iter().all(|c| !c.starts_with("create")));
    }

    #[tokio::test]
    async fn full_booking_stores_the_offset_time() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.identity.auth_token = Some(TOKEN.into());
            ctx.service = Some(license());
            ctx.stage = Stage::Date;
        })
        .await;

        say(&h, "28/12").await;
        let resp = say(&h, "10:30").await;
        assert_eq!(resp.stage, ReplyStage::Confirm);
        assert!(resp.message.contains("10:30"));

        let resp = say(&h, "نعم").await;
        assert!(resp.ok);
        assert_eq!(resp.stage, ReplyStage::Done);
        assert!(
            h.directory
                .calls()
                .contains(&"create LICENSE 2026-12-28T08:30:00+00:00".to_string())
        );
        let ctx = ctx(&h).await;
        assert_eq!(ctx.stage, Stage::Service);
        assert!(ctx.service.is_none());
        assert!(ctx.is_authenticated());
    }

    #[tokio::test]
    async fn past_date_is_refused_and_stage_kept() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.identity.auth_token = Some(TOKEN.into());
            ctx.service = Some(license());
            ctx.stage = Stage::Date;
        })
        .await;

        let resp = say(&h, "1/3").await;
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some(codes::BUSINESS_RULE));
        assert_eq!(resp.stage, ReplyStage::Date);
        assert_eq!(ctx(&h).await.stage, Stage::Date);
    }

    #[tokio::test]
    async fn booking_that_became_past_restarts_at_date() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.identity.auth_token = Some(TOKEN.into());
            ctx.service = Some(license());
            ctx.stage = Stage::Date;
        })
        .await;
        say(&h, "16/10").await;
        say(&h, "11").await;

        h.clock.set(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
        let resp = say(&h, "نعم").await;
        assert!(!resp.ok);
        assert_eq!(resp.stage, ReplyStage::Date);
        assert_eq!(ctx(&h).await.booking, Default::default());
        assert!(h.directory.calls().iter().all(|c| !c.starts_with("create")));
    }

    #[tokio::test]
    async fn duplicate_service_is_refused_before_date() {
        let h = harness(
            ScriptedClassifier::new(),
            directory().with_upcoming(
                "a1",
                "LICENSE",
                "رخصة قيادة",
                Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap(),
            ),
        );
        seed(&h, |ctx| ctx.identity.auth_token = Some(TOKEN.into())).await;

        let resp = say(&h, "بدي رخصة سواقة").await;
        assert!(!resp.ok);
        assert_eq!(resp.message, messages::DUPLICATE_BOOKING);
        let ctx = ctx(&h).await;
        assert_eq!(ctx.stage, Stage::Service);
        assert!(ctx.service.is_none());
    }

    #[tokio::test]
    async fn ambiguous_request_lists_alternatives_then_accepts_an_index() {
        let h = harness(ScriptedClassifier::new(), directory());

        let resp = say(&h, "شي عن الرخصة").await;
        assert_eq!(resp.stage, ReplyStage::ServiceClarification);
        let listed = ctx(&h).await.service_alternatives;
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].service_id, "LICENSE_RENEW");

        let resp = say(&h, "2").await;
        assert_eq!(resp.stage, ReplyStage::Service);
        let ctx = ctx(&h).await;
        assert_eq!(ctx.service.as_ref().map(|s| s.id.as_str()), Some("LICENSE"));
        assert_eq!(ctx.gate, Gate::AwaitingInquiryType);
        assert!(ctx.service_alternatives.is_empty());
        // Only the first turn consulted the classifier.
        assert_eq!(h.classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn unmatched_clarification_answer_is_resolved_again() {
        let h = harness(ScriptedClassifier::new(), directory());

        let resp = say(&h, "شي عن الرخصة").await;
        assert_eq!(resp.stage, ReplyStage::ServiceClarification);

        let resp = say(&h, "لا، بدي رخصة سواقة جديدة").await;
        assert!(resp.ok);
        assert_eq!(resp.stage, ReplyStage::Service);
        assert_eq!(resp.message, messages::ask_inquiry_type("رخصة قيادة"));
        let ctx = ctx(&h).await;
        assert_eq!(ctx.service, Some(license()));
        assert!(ctx.service_alternatives.is_empty());
        assert_eq!(h.classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn inquiry_then_yes_sends_guest_to_verification_and_back() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.service = Some(license());
            ctx.gate = Gate::AwaitingInquiryType;
        })
        .await;

        let resp = say(&h, "كم السعر؟").await;
        assert!(resp.message.contains("150"));
        assert_eq!(ctx(&h).await.gate, Gate::AwaitingBookingConfirm);

        let resp = say(&h, "نعم").await;
        assert_eq!(resp.stage, ReplyStage::Identity);
        assert_eq!(ctx(&h).await.after_identity, Some(Goal::Book));

        say(&h, "123456789").await;
        let resp = say(&h, "0591234567").await;
        assert_eq!(resp.message, messages::OTP_SENT);

        let resp = say(&h, "4321").await;
        assert!(resp.ok);
        assert_eq!(resp.stage, ReplyStage::Date);
        let ctx = ctx(&h).await;
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.service, Some(license()));
        assert!(ctx.after_identity.is_none());
    }

    #[tokio::test]
    async fn replayed_otp_is_rejected() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.stage = Stage::Identity;
            ctx.identity.national_id = Some("123456789".into());
            ctx.identity.phone_number = Some("0591234567".into());
        })
        .await;
        let snapshot = ctx(&h).await;

        let resp = say(&h, "4321").await;
        assert!(resp.ok);
        assert!(ctx(&h).await.is_authenticated());

        h.store.put(SENDER, snapshot).await.unwrap();
        let resp = say(&h, "4321").await;
        assert_eq!(resp.message, messages::WRONG_OTP);
        assert_eq!(resp.stage, ReplyStage::Identity);
        assert!(!ctx(&h).await.is_authenticated());
    }

    #[tokio::test]
    async fn modify_single_appointment_reschedules_it() {
        let h = harness(
            ScriptedClassifier::new().with("بدي اعدل موعدي", INTENT_MODIFY, 0.88),
            directory().with_upcoming(
                "a1",
                "LICENSE",
                "رخصة قيادة",
                Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap(),
            ),
        );
        seed(&h, |ctx| ctx.identity.auth_token = Some(TOKEN.into())).await;

        let resp = say(&h, "بدي اعدل موعدي").await;
        assert_eq!(resp.stage, ReplyStage::Date);
        assert!(resp.message.contains("2/11/2026"));

        // 5/1 already passed this year.
        let resp = say(&h, "5/1").await;
        assert_eq!(resp.stage, ReplyStage::Time);

        let resp = say(&h, "3").await;
        assert!(resp.ok);
        assert_eq!(resp.message, messages::appointment_modified(
            NaiveDate::from_ymd_opt(2027, 1, 5).unwrap(),
            "3:00",
        ));
        assert!(
            h.directory
                .calls()
                .contains(&"reschedule a1 2027-01-05T13:00:00+00:00".to_string())
        );
        assert_eq!(ctx(&h).await.flow, SubFlow::None);
    }

    #[tokio::test]
    async fn cancel_requires_verification_then_confirms() {
        let h = harness(
            ScriptedClassifier::new().with("بدي الغي الموعد", INTENT_CANCEL, 0.9),
            directory().with_upcoming(
                "a1",
                "LICENSE",
                "رخصة قيادة",
                Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap(),
            ),
        );

        let resp = say(&h, "بدي الغي الموعد").await;
        assert_eq!(resp.message, messages::VERIFY_TO_CANCEL);

        say(&h, "123456789").await;
        say(&h, "0591234567").await;
        let resp = say(&h, "4321").await;
        assert_eq!(resp.stage, ReplyStage::Confirm);

        let resp = say(&h, "نعم").await;
        assert_eq!(resp.message, messages::CANCEL_DONE);
        assert!(h.directory.calls().contains(&"cancel a1".to_string()));
    }

    fn two_upcoming() -> RecordingDirectory {
        directory()
            .with_upcoming(
                "a1",
                "LICENSE",
                "رخصة قيادة",
                Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap(),
            )
            .with_upcoming(
                "a2",
                "ID_CARD",
                "بطاقة هوية وجواز سفر",
                Utc.with_ymd_and_hms(2026, 11, 9, 7, 0, 0).unwrap(),
            )
    }

    #[tokio::test]
    async fn modify_with_two_appointments_asks_which_and_accepts_an_index() {
        let h = harness(
            ScriptedClassifier::new().with("بدي اعدل موعدي", INTENT_MODIFY, 0.9),
            two_upcoming(),
        );
        seed(&h, |ctx| ctx.identity.auth_token = Some(TOKEN.into())).await;

        let resp = say(&h, "بدي اعدل موعدي").await;
        assert_eq!(resp.stage, ReplyStage::Date);
        assert!(resp.message.contains("1. رخصة قيادة بتاريخ 2/11/2026"));
        assert!(resp.message.contains("2. بطاقة هوية وجواز سفر بتاريخ 9/11/2026"));
        assert_eq!(ctx(&h).await.flow, SubFlow::Modify(ModifyStep::AskWhichAppointment));

        let resp = say(&h, "مش عارف").await;
        assert_eq!(resp.message, messages::APPOINTMENT_NOT_MATCHED);
        assert_eq!(resp.stage, ReplyStage::Date);
        assert_eq!(ctx(&h).await.flow, SubFlow::Modify(ModifyStep::AskWhichAppointment));

        let resp = say(&h, "2").await;
        assert_eq!(resp.message, messages::ASK_NEW_DATE);
        assert_eq!(
            ctx(&h).await.flow,
            SubFlow::Modify(ModifyStep::WaitingNewDate {
                appointment_id: "a2".into()
            })
        );
    }

    #[tokio::test]
    async fn cancel_with_two_appointments_picks_by_service_name() {
        let h = harness(
            ScriptedClassifier::new().with("بدي الغي الموعد", INTENT_CANCEL, 0.9),
            two_upcoming(),
        );
        seed(&h, |ctx| ctx.identity.auth_token = Some(TOKEN.into())).await;

        let resp = say(&h, "بدي الغي الموعد").await;
        assert_eq!(resp.stage, ReplyStage::Service);
        assert!(resp.message.contains("1. رخصة قيادة"));
        assert!(resp.message.contains("2. بطاقة هوية وجواز سفر"));
        assert_eq!(ctx(&h).await.flow, SubFlow::Cancel(CancelStep::AskWhichAppointment));

        let resp = say(&h, "بطاقة هوية").await;
        assert_eq!(resp.stage, ReplyStage::Confirm);
        assert!(resp.message.contains("بطاقة هوية وجواز سفر"));
        assert_eq!(
            ctx(&h).await.flow,
            SubFlow::Cancel(CancelStep::ConfirmCancel {
                appointment_id: "a2".into()
            })
        );

        let resp = say(&h, "نعم").await;
        assert_eq!(resp.message, messages::CANCEL_DONE);
        let calls = h.directory.calls();
        assert_eq!(calls.last().map(String::as_str), Some("cancel a2"));
        assert!(!calls.contains(&"cancel a1".to_string()));
    }

    #[tokio::test]
    async fn appointments_word_is_not_a_repeat_request() {
        let h = harness(
            ScriptedClassifier::new().with("بدي اعدل مواعيدي", INTENT_MODIFY, 0.95),
            directory(),
        );

        let first = say(&h, "مرحبا").await;
        let resp = say(&h, "بدي اعدل مواعيدي").await;
        assert_ne!(resp.message, first.message);
        assert_eq!(resp.message, messages::VERIFY_TO_MODIFY);
        assert_eq!(resp.stage, ReplyStage::Identity);
        assert_eq!(ctx(&h).await.after_identity, Some(Goal::Modify));
        assert!(h.classifier.calls().contains(&"بدي اعدل مواعيدي".to_string()));
    }

    #[tokio::test]
    async fn collaborator_outage_keeps_the_context() {
        let h = harness(ScriptedClassifier::failing(), directory());
        seed(&h, |ctx| ctx.last_bot_message = Some("سابق".into())).await;

        let resp = say(&h, "مرحبا").await;
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some(codes::COLLABORATOR_UNAVAILABLE));
        assert_eq!(resp.message, messages::COLLABORATOR_APOLOGY);
        assert_eq!(ctx(&h).await.last_bot_message.as_deref(), Some("سابق"));
    }

    #[tokio::test]
    async fn repeat_replays_the_last_message() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |ctx| {
            ctx.stage = Stage::Identity;
            ctx.last_bot_message = Some(messages::ASK_PHONE.into());
        })
        .await;

        let resp = say(&h, "عيد لو سمحت").await;
        assert_eq!(resp.message, messages::ASK_PHONE);
        assert_eq!(resp.stage, ReplyStage::Identity);
    }

    #[tokio::test]
    async fn reset_and_idle_eviction_forget_contexts() {
        let h = harness(ScriptedClassifier::new(), directory());
        seed(&h, |_| {}).await;
        assert!(h.engine.reset(SENDER).await.unwrap());
        assert!(!h.engine.reset(SENDER).await.unwrap());

        seed(&h, |_| {}).await;
        h.clock.set(today_morning() + Duration::hours(25));
        assert_eq!(h.engine.evict_idle().await.unwrap(), 1);
        assert!(h.store.is_empty().await);
    }
}
