//! Calendar v3 event insertion

use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::read_json;
use crate::notify::NotifyError;

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    #[serde(rename = "htmlLink", default)]
    html_link: Option<String>,
}

/// Request body for one task event
///
/// Times carry their own offset; the `timeZone` tag is always UTC.
pub fn event_body(summary: &str, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> serde_json::Value {
    serde_json::json!({
        "summary": summary,
        "start": {"dateTime": start.to_rfc3339(), "timeZone": "UTC"},
        "end": {"dateTime": end.to_rfc3339(), "timeZone": "UTC"},
    })
}

/// Insert an event and return its `htmlLink`
pub async fn insert_event(
    http: &Client,
    base_url: &str,
    calendar_id: &str,
    access_token: &str,
    body: &serde_json::Value,
) -> Result<Option<String>, NotifyError> {
    let url = format!("{}/calendar/v3/calendars/{}/events", base_url, calendar_id);
    debug!(%url, "insert_event: called");

    let response = http.post(&url).bearer_auth(access_token).json(body).send().await?;
    let event: InsertedEvent = read_json(response).await?;
    Ok(event.html_link)
}
