//! Keyword tables for the configured locale.
//!
//! Control flow never names a keyword directly; it asks a [`KeywordSet`] or
//! [`ConfirmationTable`] held by the [`Vocabulary`]. Swapping the locale means
//! constructing a different `Vocabulary`.

use crate::parsers::confirm::Confirmation;

/// How the terms of a [`KeywordSet`] are located in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Term may appear anywhere, including inside a longer word
    Substring,
    /// Term must cover whole tokens. A leading conjunction prefix is tolerated.
    Token,
}

#[derive(Debug, Clone)]
pub struct KeywordSet {
    terms: Vec<String>,
    mode: MatchMode,
}

impl KeywordSet {
    pub fn new(mode: MatchMode, terms: &[&str]) -> Self {
        Self {
            terms: terms.iter().map(|t| normalize_text(t)).collect(),
            mode,
        }
    }

    pub fn substring(terms: &[&str]) -> Self {
        Self::new(MatchMode::Substring, terms)
    }

    pub fn token(terms: &[&str]) -> Self {
        Self::new(MatchMode::Token, terms)
    }

    /// Expects text already passed through [`normalize_text`].
    pub fn matches_normalized(&self, normalized: &str) -> bool {
        self.terms
            .iter()
            .filter(|term| !term.is_empty())
            .any(|term| match self.mode {
                MatchMode::Substring => normalized.contains(term.as_str()),
                MatchMode::Token => contains_tokens(normalized, term),
            })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matches_normalized(&normalize_text(text))
    }
}

fn contains_tokens(normalized: &str, term: &str) -> bool {
    let haystack = format!(" {normalized} ");
    if haystack.contains(&format!(" {term} ")) {
        return true;
    }
    haystack.contains(&format!(" {CONJUNCTION_PREFIX}{term} "))
}

/// "و" (and) is glued to the following word in written Arabic.
const CONJUNCTION_PREFIX: char = 'و';

/// Affirmative and negative vocabularies for one yes/no question.
#[derive(Debug, Clone)]
pub struct ConfirmationTable {
    pub yes: KeywordSet,
    pub no: KeywordSet,
    /// When both sides match, the negative reading is taken
    pub negative_wins: bool,
}

impl ConfirmationTable {
    pub fn classify(&self, text: &str) -> Option<Confirmation> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return None;
        }
        let yes = self.yes.matches_normalized(&normalized);
        let no = self.no.matches_normalized(&normalized);
        match (yes, no) {
            (true, true) if self.negative_wins => Some(Confirmation::No),
            (true, _) => Some(Confirmation::Yes),
            (false, true) => Some(Confirmation::No),
            (false, false) => None,
        }
    }
}

/// Vocabulary of the reasons a previous identity card needs replacing.
#[derive(Debug, Clone)]
pub struct IssuanceReasonTerms {
    pub lost: KeywordSet,
    pub damaged: KeywordSet,
    pub data_update: KeywordSet,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Yes/no at the booking CONFIRM step and after an inquiry answer
    pub booking_confirmation: ConfirmationTable,
    pub cancel_confirmation: ConfirmationTable,
    /// "Did you have an identity card before?"
    pub previous_id: ConfirmationTable,
    pub price: KeywordSet,
    pub documents: KeywordSet,
    /// Signals that the user left a structured step to ask something
    pub topic_shift: KeywordSet,
    pub repeat: KeywordSet,
    /// Explicit modify / cancel wording
    pub flow_switch: KeywordSet,
    /// Canonical-name marker of the identity-document service family
    pub identity_document: KeywordSet,
    pub issuance_reasons: IssuanceReasonTerms,
}

impl Default for Vocabulary {
    /// Levantine Arabic, the deployment's single locale.
    fn default() -> Self {
        Self {
            booking_confirmation: ConfirmationTable {
                yes: KeywordSet::token(&["نعم", "اه", "أه", "تمام", "مزبوط", "صح"]),
                no: KeywordSet::token(&["لا", "مش", "غلط", "غير"]),
                negative_wins: false,
            },
            cancel_confirmation: ConfirmationTable {
                yes: KeywordSet::token(&["نعم", "اه", "آه", "موافق", "تمام"]),
                no: KeywordSet::token(&["لا", "مش", "الغاء"]),
                negative_wins: true,
            },
            previous_id: ConfirmationTable {
                yes: KeywordSet::token(&["نعم", "آه", "اه", "كان", "كانت", "ايوه"]),
                no: KeywordSet::token(&["لا", "أول مرة", "اول مرة", "ما", "ما كان", "ما عندي"]),
                negative_wins: true,
            },
            price: KeywordSet::substring(&["سعر", "السعر", "كم", "كم بتكلف", "تكلفة", "رسوم"]),
            documents: KeywordSet::substring(&[
                "مستندات",
                "المستندات",
                "اوراق",
                "أوراق",
                "شو لازم",
                "شو اجيب",
                "الوثائق",
            ]),
            topic_shift: KeywordSet::substring(&[
                "استفسر",
                "استفسار",
                "بدي استفسر",
                "سؤال",
                "اسأل",
                "احكيلي",
                "شو",
                "ايش",
                "كيف",
                "خدمة",
                "خدمات",
                "معلومات",
                "تفاصيل",
            ]),
            repeat: KeywordSet::token(&[
                "عيد", "عيدي", "اعيد", "أعيد", "اعيدي", "عيدها", "كرر", "كررها", "كرري", "ما سمعت",
            ]),
            flow_switch: KeywordSet::substring(&[
                "عدل", "تعديل", "غير موعد", "الغي", "ألغي", "الغاء", "إلغاء", "modify", "cancel",
            ]),
            identity_document: KeywordSet::substring(&["هوية"]),
            issuance_reasons: IssuanceReasonTerms {
                lost: KeywordSet::substring(&["ضاع", "ضايع", "فقدت", "مفقود", "انسرق", "سرق"]),
                damaged: KeywordSet::substring(&["تالف", "تلفت", "مكسور", "انكسر", "ممزق", "اهترأ", "مخرب"]),
                data_update: KeywordSet::substring(&["تعديل", "تغيير", "تحديث", "بيانات", "ملحق"]),
            },
        }
    }
}

/// Lower-cases, drops sentence punctuation, and collapses whitespace.
pub fn normalize_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .map(|ch| if is_sentence_punctuation(ch) { ' ' } else { ch })
        .collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_sentence_punctuation(ch: char) -> bool {
    matches!(ch, '؟' | '?' | '!' | '.' | '،' | ',')
}
