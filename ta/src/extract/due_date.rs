//! Due date parser
//!
//! A strict `YYYY-MM-DD HH:MM:SS` substring gates everything: without one
//! the input is rejected outright. Only the extracted substring is then tried
//! against the format ladder, so the date-only and time-only formats can
//! never win in practice. Keep it that way; callers rely on "no strict
//! timestamp" meaning "ask the scheduler".

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::{CANONICAL_FORMAT, is_calendar_timestamp};

static STRICT_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid timestamp regex"));

/// Why a candidate string did not yield a due date
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DueDateError {
    #[error("no date found")]
    NoDateFound,

    #[error("unparseable date: {0}")]
    Unparseable(String),
}

/// One rung of the format ladder
#[derive(Debug, Clone, Copy)]
enum Format {
    DateTime,
    DateOnly,
    TimeOnly,
}

const LADDER: [Format; 3] = [Format::DateTime, Format::DateOnly, Format::TimeOnly];

impl Format {
    fn parse(self, s: &str) -> Option<NaiveDateTime> {
        match self {
            Format::DateTime => NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).ok(),
            Format::DateOnly => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Format::TimeOnly => NaiveTime::parse_from_str(s, "%I:%M %p")
                .ok()
                .and_then(|t| NaiveDate::from_ymd_opt(1900, 1, 1).map(|d| d.and_time(t))),
        }
    }
}

/// Extract and parse the first strict timestamp in `candidate`
pub fn parse_due_date(candidate: &str) -> Result<NaiveDateTime, DueDateError> {
    let Some(found) = STRICT_TIMESTAMP.find(candidate) else {
        debug!(%candidate, "parse_due_date: no strict timestamp");
        return Err(DueDateError::NoDateFound);
    };
    let extracted = found.as_str();

    LADDER
        .iter()
        .find_map(|format| format.parse(extracted).filter(is_calendar_timestamp))
        .ok_or_else(|| {
            debug!(%extracted, "parse_due_date: no format matched");
            DueDateError::Unparseable(extracted.to_string())
        })
}
