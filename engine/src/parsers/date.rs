use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::normalize_digits;

static DAY_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})[/\-]([0-9]{1,2})").expect("valid day/month regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMonth {
    pub day: u32,
    pub month: u32,
}

impl DayMonth {
    /// `None` when the pair does not exist in `year` (e.g. 31/02).
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

/// Finds the first `day/month` (or `day-month`) pair in the text.
pub fn parse_day_month(text: &str) -> Option<DayMonth> {
    let normalized = normalize_digits(text);
    let caps = DAY_MONTH_RE.captures(&normalized)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }
    Some(DayMonth { day, month })
}

/// Parses a day/month pair and places it in `year`.
pub fn parse_date(text: &str, year: i32) -> Option<NaiveDate> {
    parse_day_month(text)?.in_year(year)
}

/// ISO `yyyy-mm-dd`, as written to the logs.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
