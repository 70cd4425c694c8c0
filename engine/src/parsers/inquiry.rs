use crate::vocabulary::{Vocabulary, normalize_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryType {
    Price,
    Documents,
}

/// Price wording is checked before documents wording.
pub fn parse_inquiry_type(text: &str, vocabulary: &Vocabulary) -> Option<InquiryType> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return None;
    }
    if vocabulary.price.matches_normalized(&normalized) {
        return Some(InquiryType::Price);
    }
    if vocabulary.documents.matches_normalized(&normalized) {
        return Some(InquiryType::Documents);
    }
    None
}
