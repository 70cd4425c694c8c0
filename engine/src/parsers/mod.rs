//! Deterministic parsers: text in, structured value or `None` out.

pub mod confirm;
pub mod date;
pub mod inquiry;
pub mod issuance;
pub mod name;
pub mod time;

/// Maps Arabic-Indic and Eastern Arabic-Indic digits to ASCII.
///
/// Speech transcripts mix both numeral systems.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{0660}'..='\u{0669}' => ascii_digit(ch as u32 - 0x0660),
            '\u{06F0}'..='\u{06F9}' => ascii_digit(ch as u32 - 0x06F0),
            other => other,
        })
        .collect()
}

fn ascii_digit(offset: u32) -> char {
    char::from_digit(offset, 10).unwrap_or('0')
}

/// Every digit of the text, in order, as ASCII.
pub fn digits_only(text: &str) -> String {
    normalize_digits(text)
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .collect()
}
