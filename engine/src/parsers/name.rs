use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Number of name parts a full display name must have.
pub const NAME_PARTS: usize = 4;

/// Arabic letters with combining vowel marks, or ASCII letters. Arabic-script
/// digits and punctuation are excluded.
static NAME_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[[\p{Arabic}&&\p{L}]\p{M}A-Za-z]+$").expect("valid name part regex")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name must have exactly {expected} parts, found {found}")]
    WrongTokenCount { expected: usize, found: usize },
    #[error("name part {part:?} may only contain letters")]
    InvalidCharacters { part: String },
}

/// Checks that `name` is four whitespace separated parts of letters only.
/// Returns the parts on success.
pub fn validate_display_name(name: &str) -> Result<Vec<&str>, NameError> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() != NAME_PARTS {
        return Err(NameError::WrongTokenCount {
            expected: NAME_PARTS,
            found: parts.len(),
        });
    }
    if let Some(bad) = parts.iter().find(|part| !NAME_PART_RE.is_match(part)) {
        return Err(NameError::InvalidCharacters {
            part: (*bad).to_string(),
        });
    }
    Ok(parts)
}
