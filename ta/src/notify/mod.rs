//! Notification sinks
//!
//! Where finished tasks go after they are saved: one calendar event per new
//! task, or an email summary of the whole list.

pub mod google;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use thiserror::Error;

use crate::domain::Task;

pub use google::GoogleSink;
pub use google::auth::AuthError;

/// Opening line of every summary email
pub const SUMMARY_HEADER: &str = "Here are your tasks:";

/// Errors from notification sinks
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NotifyError {
    /// Only a lost authorization ends the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, NotifyError::Auth(e) if e.is_fatal())
    }
}

/// Result of `create_event`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Created { link: Option<String> },
    /// The task has no usable due date
    Skipped,
}

/// Result of `send_summary`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Sent { id: String },
    /// No recipient configured; nothing was sent
    NoRecipient,
}

/// Destination for task notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Create a calendar event ending at the task's due date
    async fn create_event(&self, task: &Task) -> Result<EventOutcome, NotifyError>;

    /// Send every task as one summary message
    async fn send_summary(&self, subject: &str, tasks: &[Task]) -> Result<SummaryOutcome, NotifyError>;
}

/// Body of the summary email
///
/// One `"{i}) {first line} (Due: {due})"` line per task, numbered from 1.
pub fn render_summary(tasks: &[Task]) -> String {
    let lines: Vec<String> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format!("{}) {} (Due: {})", i + 1, task.headline(), task.due_date))
        .collect();
    format!("{}\n\n{}", SUMMARY_HEADER, lines.join("\n"))
}

/// Start and end of the event for a due date
///
/// The due date is read as wall-clock time in `offset`; the event ends at it
/// and starts `lead_minutes` earlier.
pub fn event_window(
    due: NaiveDateTime,
    offset: FixedOffset,
    lead_minutes: i64,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let end = offset.from_local_datetime(&due).single()?;
    let start = end - Duration::minutes(lead_minutes);
    Some((start, end))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DueDate;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn test_summary_uses_first_line_only() {
        let tasks = vec![Task::new("A\nmore text", DueDate::At(ts(2025, 1, 1, 0, 0)))];
        let summary = render_summary(&tasks);
        assert_eq!(summary, "Here are your tasks:\n\n1) A (Due: 2025-01-01 00:00:00)");
    }

    #[test]
    fn test_summary_numbers_tasks_in_order() {
        let tasks = vec![
            Task::new("Buy milk", DueDate::At(ts(2025, 3, 1, 10, 0))),
            Task::new("Call mom", DueDate::NotSpecified),
        ];
        let summary = render_summary(&tasks);
        assert!(summary.ends_with("1) Buy milk (Due: 2025-03-01 10:00:00)\n2) Call mom (Due: Not specified)"));
    }

    #[test]
    fn test_event_window_in_fixed_offset() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let (start, end) = event_window(ts(2025, 3, 1, 10, 0), ist, 30).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-01T09:30:00+05:30");
        assert_eq!(end.to_rfc3339(), "2025-03-01T10:00:00+05:30");
    }

    #[test]
    fn test_event_window_crosses_midnight() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let (start, _) = event_window(ts(2025, 3, 1, 0, 10), utc, 30).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-02-28T23:40:00+00:00");
    }

    #[test]
    fn test_only_auth_loss_is_fatal() {
        let fatal = NotifyError::Auth(AuthError::ReauthenticationRequired {
            reason: "refresh rejected".to_string(),
        });
        assert!(fatal.is_fatal());
        assert!(!NotifyError::InvalidResponse("x".to_string()).is_fatal());
        assert!(
            !NotifyError::Api {
                status: 500,
                message: "boom".to_string()
            }
            .is_fatal()
        );
    }
}
