use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// Yes/no reading of a booking confirmation. `None` when neither side matches.
pub fn parse_confirmation(text: &str, vocabulary: &Vocabulary) -> Option<Confirmation> {
    vocabulary.booking_confirmation.classify(text)
}
