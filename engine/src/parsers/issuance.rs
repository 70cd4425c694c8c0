use crate::vocabulary::{Vocabulary, normalize_text};

/// Service id for a first identity card.
pub const FIRST_TIME_SERVICE_ID: &str = "ISSUE_ID_FIRST_TIME";
/// Display name used for [`FIRST_TIME_SERVICE_ID`] without a catalog lookup.
pub const FIRST_TIME_SERVICE_NAME: &str = "إصدار هوية لأول مرة";

/// Why someone who already had an identity card needs a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceReason {
    Lost,
    Damaged,
    DataUpdate,
}

impl IssuanceReason {
    pub fn service_id(self) -> &'static str {
        match self {
            IssuanceReason::Lost => "ISSUE_ID_LOST",
            IssuanceReason::Damaged => "ISSUE_ID_DAMAGED",
            IssuanceReason::DataUpdate => "ID_APPENDIX",
        }
    }
}

/// Lost is checked first, then damaged, then data update.
pub fn detect_issuance_reason(text: &str, vocabulary: &Vocabulary) -> Option<IssuanceReason> {
    let normalized = normalize_text(text);
    let reasons = &vocabulary.issuance_reasons;
    if reasons.lost.matches_normalized(&normalized) {
        Some(IssuanceReason::Lost)
    } else if reasons.damaged.matches_normalized(&normalized) {
        Some(IssuanceReason::Damaged)
    } else if reasons.data_update.matches_normalized(&normalized) {
        Some(IssuanceReason::DataUpdate)
    } else {
        None
    }
}
