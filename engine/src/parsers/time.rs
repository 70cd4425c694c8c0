use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use super::normalize_digits;

static HOUR_MINUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})(?::([0-9]{2}))?").expect("valid hour:minute regex")
});

const MAX_SPOKEN_HOUR: u32 = 24;

/// Spoken hours in this range mean the afternoon ("at 3" is 15:00).
const AFTERNOON_HOURS: std::ops::RangeInclusive<u32> = 1..=7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTime {
    /// Time of day in storage time (local hour shifted by the storage offset)
    pub stored: NaiveTime,
    /// The hour and minute as the user said them, e.g. `3:00`
    pub display: String,
}

impl ParsedTime {
    /// `HH:mm` in storage time, as written to the logs.
    pub fn stored_hhmm(&self) -> String {
        self.stored.format("%H:%M").to_string()
    }
}

/// Extracts `hour[:minute]`, applies the afternoon convention, and shifts
/// the result by `storage_offset_hours`.
///
/// Returns `None` when the spoken hour or minute is out of range, or when
/// the shifted hour leaves the day. A spoken 24 is accepted and lands
/// inside the day once shifted by a negative offset.
pub fn parse_time(text: &str, storage_offset_hours: i32) -> Option<ParsedTime> {
    let normalized = normalize_digits(text);
    let caps = HOUR_MINUTE_RE.captures(&normalized)?;
    let spoken_hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if spoken_hour > MAX_SPOKEN_HOUR || minute > 59 {
        return None;
    }

    let local_hour = if AFTERNOON_HOURS.contains(&spoken_hour) {
        spoken_hour + 12
    } else {
        spoken_hour
    };
    let stored_hour = i64::from(local_hour) + i64::from(storage_offset_hours);
    if !(0..=23).contains(&stored_hour) {
        return None;
    }

    let stored = NaiveTime::from_hms_opt(u32::try_from(stored_hour).ok()?, minute, 0)?;
    Some(ParsedTime {
        stored,
        display: format!("{spoken_hour}:{minute:02}"),
    })
}
