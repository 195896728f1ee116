//! Task record and due date

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rendering of a resolved due date
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel stored when a task has no due date
pub const NOT_SPECIFIED: &str = "Not specified";

/// Whether `ts` is an ordinary calendar instant
///
/// chrono accepts a `:60` second (stored as a leap nanosecond) and year 0;
/// neither survives the calendar APIs, so both are rejected as due dates.
pub fn is_calendar_timestamp(ts: &NaiveDateTime) -> bool {
    ts.nanosecond() < 1_000_000_000 && ts.year() >= 1
}

/// Ordered task list, oldest first
pub type TaskList = Vec<Task>;

/// Due date of a task: a naive timestamp or the "Not specified" sentinel
///
/// There is no variant for free text, so an unparsed fragment can never be
/// stored as a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DueDate {
    At(NaiveDateTime),
    NotSpecified,
}

impl DueDate {
    /// The timestamp, if one was resolved
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            DueDate::At(ts) => Some(*ts),
            DueDate::NotSpecified => None,
        }
    }

    pub fn is_specified(&self) -> bool {
        matches!(self, DueDate::At(_))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueDate::At(ts) => write!(f, "{}", ts.format(CANONICAL_FORMAT)),
            DueDate::NotSpecified => f.write_str(NOT_SPECIFIED),
        }
    }
}

impl From<DueDate> for String {
    fn from(value: DueDate) -> Self {
        value.to_string()
    }
}

impl From<String> for DueDate {
    fn from(value: String) -> Self {
        if value == NOT_SPECIFIED {
            return DueDate::NotSpecified;
        }
        match NaiveDateTime::parse_from_str(&value, CANONICAL_FORMAT) {
            Ok(ts) if is_calendar_timestamp(&ts) => DueDate::At(ts),
            Ok(_) => {
                warn!(due_date = %value, "Stored due date is outside the calendar, treating as not specified");
                DueDate::NotSpecified
            }
            Err(e) => {
                warn!(due_date = %value, error = %e, "Stored due date is not canonical, treating as not specified");
                DueDate::NotSpecified
            }
        }
    }
}

/// A task produced from one plan
///
/// Serialized as `{"task": ..., "due_date": ...}`, the shape of existing
/// `plan.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task")]
    pub description: String,
    pub due_date: DueDate,
}

impl Task {
    pub fn new(description: impl Into<String>, due_date: DueDate) -> Self {
        Self {
            description: description.into(),
            due_date,
        }
    }

    /// First line of the description, used in one-line summaries
    pub fn headline(&self) -> &str {
        self.description.split('\n').next().unwrap_or_default()
    }
}
