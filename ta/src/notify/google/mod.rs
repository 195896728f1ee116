//! Google Calendar and Gmail sink
//!
//! Both APIs are called over plain REST with a bearer token from
//! [`auth::CredentialStore`].

pub mod auth;
pub mod calendar;
pub mod gmail;

use async_trait::async_trait;
use chrono::FixedOffset;
use colored::Colorize;
use eyre::{Result, eyre};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use self::auth::CredentialStore;
use super::{EventOutcome, NotificationSink, NotifyError, SummaryOutcome, event_window, render_summary};
use crate::config::Config;
use crate::domain::Task;

/// Decode a successful JSON response or turn the status into an error
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, NotifyError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(NotifyError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    serde_json::from_str(&body).map_err(|e| NotifyError::InvalidResponse(format!("{}: {}", e, body)))
}

/// Notification sink backed by the user's Google account
pub struct GoogleSink {
    credentials: CredentialStore,
    http: Client,
    calendar_base_url: String,
    gmail_base_url: String,
    calendar_id: String,
    offset: FixedOffset,
    lead_minutes: i64,
    recipient: Option<String>,
}

impl GoogleSink {
    pub fn from_config(config: &Config) -> Result<Self> {
        let offset = FixedOffset::east_opt(config.calendar.utc_offset_minutes * 60)
            .ok_or_else(|| eyre!("Invalid calendar utc-offset-minutes: {}", config.calendar.utc_offset_minutes))?;
        let http = Client::new();
        let google = &config.google;

        Ok(Self {
            credentials: CredentialStore::new(&google.token_path, &google.token_uri, http.clone()),
            http,
            calendar_base_url: google.calendar_base_url.trim_end_matches('/').to_string(),
            gmail_base_url: google.gmail_base_url.trim_end_matches('/').to_string(),
            calendar_id: google.calendar_id.clone(),
            offset,
            lead_minutes: config.calendar.lead_minutes,
            recipient: config.notify.recipient(),
        })
    }
}

#[async_trait]
impl NotificationSink for GoogleSink {
    async fn create_event(&self, task: &Task) -> Result<EventOutcome, NotifyError> {
        debug!(description = %task.description, due = %task.due_date, "create_event: called");
        let window = task
            .due_date
            .timestamp()
            .and_then(|due| event_window(due, self.offset, self.lead_minutes));
        let Some((start, end)) = window else {
            println!(
                "{}",
                "Due date not specified or invalid. Skipping calendar event creation.".yellow()
            );
            return Ok(EventOutcome::Skipped);
        };

        let token = self.credentials.access_token().await?;
        let body = calendar::event_body(&task.description, start, end);
        let link = calendar::insert_event(&self.http, &self.calendar_base_url, &self.calendar_id, &token, &body).await?;

        println!("{}", format!("Event created: {}", link.as_deref().unwrap_or("None")).green());
        info!(?link, "create_event: event created");
        Ok(EventOutcome::Created { link })
    }

    async fn send_summary(&self, subject: &str, tasks: &[Task]) -> Result<SummaryOutcome, NotifyError> {
        debug!(%subject, count = tasks.len(), "send_summary: called");
        let Some(recipient) = &self.recipient else {
            println!(
                "{}",
                "Recipient email address is not set. Please set the RECIPIENT_EMAIL environment variable.".red()
            );
            warn!("send_summary: no recipient configured");
            return Ok(SummaryOutcome::NoRecipient);
        };

        let message = gmail::build_message(recipient, subject, &render_summary(tasks));
        let token = self.credentials.access_token().await?;
        let id = gmail::send_message(&self.http, &self.gmail_base_url, &token, &gmail::encode_raw(&message)).await?;

        println!("{}", format!("Email sent: {}", id).green());
        info!(%id, "send_summary: email sent");
        Ok(SummaryOutcome::Sent { id })
    }
}
