//! Gmail v1 message sending

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::read_json;
use crate::notify::NotifyError;

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Plain-text RFC 822 message from the authenticated user
pub fn build_message(to: &str, subject: &str, body: &str) -> String {
    format!(
        "To: {}\r\nFrom: me\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"utf-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{}",
        to, subject, body
    )
}

/// base64url form expected in the `raw` field
pub fn encode_raw(message: &str) -> String {
    URL_SAFE.encode(message.as_bytes())
}

/// Send a raw message and return its id
pub async fn send_message(
    http: &Client,
    base_url: &str,
    access_token: &str,
    raw: &str,
) -> Result<String, NotifyError> {
    let url = format!("{}/gmail/v1/users/me/messages/send", base_url);
    debug!(%url, raw_len = raw.len(), "send_message: called");

    let response = http
        .post(&url)
        .bearer_auth(access_token)
        .json(&serde_json::json!({ "raw": raw }))
        .send()
        .await?;
    let sent: SentMessage = read_json(response).await?;
    Ok(sent.id)
}
