//! Detects users leaving a structured booking step to ask something else.

use crate::context::Stage;
use crate::parsers::{confirm::parse_confirmation, date::parse_date, time::parse_time};
use crate::vocabulary::{Vocabulary, normalize_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    UserChangedTopic,
}

/// Parser settings the detector needs to recognize on-topic input.
#[derive(Debug, Clone, Copy)]
pub struct InterruptProbe {
    pub year: i32,
    pub storage_offset_hours: i32,
}

/// Returns `Some` when `text` at `stage` should abort the booking step.
///
/// Only DATE, TIME and CONFIRM are interruptible. Text the stage's own
/// parser accepts never interrupts.
pub fn detect_interrupt(
    stage: Stage,
    text: &str,
    probe: InterruptProbe,
    vocabulary: &Vocabulary,
) -> Option<InterruptReason> {
    if !matches!(stage, Stage::Date | Stage::Time | Stage::Confirm) {
        return None;
    }

    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }

    let on_topic = match stage {
        Stage::Date => parse_date(text, probe.year).is_some(),
        Stage::Time => parse_time(text, probe.storage_offset_hours).is_some(),
        Stage::Confirm => parse_confirmation(text, vocabulary).is_some(),
        _ => false,
    };
    if on_topic {
        return None;
    }

    vocabulary
        .topic_shift
        .matches_normalized(&normalized)
        .then_some(InterruptReason::UserChangedTopic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: InterruptProbe = InterruptProbe {
        year: 2026,
        storage_offset_hours: -2,
    };

    #[test]
    fn question_at_confirm_interrupts() {
        let vocab = Vocabulary::default();
        assert_eq!(
            detect_interrupt(Stage::Confirm, "شو المستندات المطلوبة؟", PROBE, &vocab),
            Some(InterruptReason::UserChangedTopic)
        );
    }

    #[test]
    fn parseable_input_never_interrupts() {
        let vocab = Vocabulary::default();
        assert_eq!(detect_interrupt(Stage::Date, "شو رأيك 28/12", PROBE, &vocab), None);
        assert_eq!(detect_interrupt(Stage::Time, "كيف الساعة 10", PROBE, &vocab), None);
        assert_eq!(detect_interrupt(Stage::Confirm, "نعم شو بعدين", PROBE, &vocab), None);
    }

    #[test]
    fn unparseable_input_without_keywords_is_a_retry() {
        let vocab = Vocabulary::default();
        assert_eq!(detect_interrupt(Stage::Date, "بكرا", PROBE, &vocab), None);
        assert_eq!(detect_interrupt(Stage::Time, "  ", PROBE, &vocab), None);
    }

    #[test]
    fn other_stages_are_never_interrupted() {
        let vocab = Vocabulary::default();
        assert_eq!(detect_interrupt(Stage::Service, "شو الخدمات", PROBE, &vocab), None);
        assert_eq!(detect_interrupt(Stage::Identity, "شو بدك", PROBE, &vocab), None);
    }
}
