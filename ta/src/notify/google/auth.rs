//! Google authorized-user credentials
//!
//! Reads the `token.json` written by the one-time consent flow, refreshes the
//! access token when it has expired and writes the refreshed token back
//! before it is used.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Refresh this long before the recorded expiry
const EXPIRY_SKEW_SECS: i64 = 60;

/// Credential errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token file not found: {}", path.display())]
    MissingToken { path: PathBuf },

    #[error("Failed to read token file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed token file: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The stored authorization is gone; the consent flow has to run again
    #[error("Reauthentication required: {reason}")]
    ReauthenticationRequired { reason: String },
}

impl AuthError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::ReauthenticationRequired { .. })
    }
}

/// Contents of an authorized-user token file
///
/// Unknown fields (scopes, universe domain, ...) are carried through
/// unchanged when the file is rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthorizedUser {
    /// An access token that is present and not about to expire
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.token.as_deref()?;
        match self.expiry {
            Some(expiry) if now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry => None,
            _ => Some(token),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token file plus the endpoint used to refresh it
pub struct CredentialStore {
    path: PathBuf,
    default_token_uri: String,
    http: Client,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, default_token_uri: impl Into<String>, http: Client) -> Self {
        Self {
            path: path.into(),
            default_token_uri: default_token_uri.into(),
            http,
        }
    }

    fn load(&self) -> Result<AuthorizedUser, AuthError> {
        if !self.path.exists() {
            return Err(AuthError::MissingToken { path: self.path.clone() });
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, user: &AuthorizedUser) -> Result<(), AuthError> {
        let content = serde_json::to_string(user)?;
        fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "persist: token file rewritten");
        Ok(())
    }

    /// A usable access token, refreshing and persisting it if needed
    ///
    /// A failed refresh deletes the token file so the next run starts from a
    /// fresh consent.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        debug!(path = %self.path.display(), "access_token: called");
        let mut user = self.load()?;

        if let Some(token) = user.valid_token(Utc::now()) {
            return Ok(token.to_string());
        }

        if user.refresh_token.is_none() {
            return Err(AuthError::ReauthenticationRequired {
                reason: "token expired and no refresh token is stored".to_string(),
            });
        }

        match self.refresh(&mut user).await {
            Ok(token) => {
                self.persist(&user)?;
                info!("access_token: token refreshed");
                Ok(token)
            }
            Err(reason) => {
                println!("{}", format!(" Token Refresh failed:{}", reason).red());
                warn!(%reason, path = %self.path.display(), "access_token: refresh failed, discarding token file");
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!(error = %e, "access_token: failed to remove token file");
                }
                Err(AuthError::ReauthenticationRequired { reason })
            }
        }
    }

    async fn refresh(&self, user: &mut AuthorizedUser) -> Result<String, String> {
        let token_uri = user.token_uri.clone().unwrap_or_else(|| self.default_token_uri.clone());
        debug!(%token_uri, "refresh: called");

        let mut form = vec![("grant_type", "refresh_token".to_string())];
        if let Some(refresh_token) = &user.refresh_token {
            form.push(("refresh_token", refresh_token.clone()));
        }
        if let Some(client_id) = &user.client_id {
            form.push(("client_id", client_id.clone()));
        }
        if let Some(client_secret) = &user.client_secret {
            form.push(("client_secret", client_secret.clone()));
        }

        let response = self
            .http
            .post(&token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("token endpoint returned {}: {}", status.as_u16(), body));
        }

        let refreshed: RefreshResponse = serde_json::from_str(&body).map_err(|e| e.to_string())?;
        user.token = Some(refreshed.access_token.clone());
        user.expiry = refreshed.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(rotated) = refreshed.refresh_token {
            user.refresh_token = Some(rotated);
        }
        Ok(refreshed.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_token(dir: &TempDir, json: serde_json::Value) -> PathBuf {
        let path = dir.path().join("token.json");
        fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[test]
    fn test_valid_token_respects_expiry() {
        let now = Utc::now();
        let mut user: AuthorizedUser = serde_json::from_value(serde_json::json!({"token": "abc"})).unwrap();
        assert_eq!(user.valid_token(now), Some("abc"));

        user.expiry = Some(now + Duration::hours(1));
        assert_eq!(user.valid_token(now), Some("abc"));

        user.expiry = Some(now + Duration::seconds(10));
        assert_eq!(user.valid_token(now), None);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let user: AuthorizedUser = serde_json::from_value(serde_json::json!({
            "token": "abc",
            "scopes": ["https://www.googleapis.com/auth/calendar"],
            "universe_domain": "googleapis.com"
        }))
        .unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["universe_domain"], "googleapis.com");
        assert_eq!(value["scopes"][0], "https://www.googleapis.com/auth/calendar");
    }

    #[tokio::test]
    async fn test_missing_token_file() {
        let temp = TempDir::new().unwrap();
        let store = CredentialStore::new(temp.path().join("token.json"), "http://unused", Client::new());
        let err = store.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_valid_token_used_without_refresh() {
        let temp = TempDir::new().unwrap();
        let expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();
        let path = write_token(&temp, serde_json::json!({"token": "live", "expiry": expiry}));
        let store = CredentialStore::new(path, "http://unused", Client::new());
        assert_eq!(store.access_token().await.unwrap(), "live");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_persisted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "r1".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "cid".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token": "fresh", "expires_in": 3599, "token_type": "Bearer"}"#)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let path = write_token(
            &temp,
            serde_json::json!({
                "token": "stale",
                "refresh_token": "r1",
                "token_uri": format!("{}/token", server.url()),
                "client_id": "cid",
                "client_secret": "secret",
                "expiry": "2020-01-01T00:00:00Z"
            }),
        );
        let store = CredentialStore::new(path.clone(), "http://unused", Client::new());

        assert_eq!(store.access_token().await.unwrap(), "fresh");
        mock.assert_async().await;

        let saved: AuthorizedUser = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.token.as_deref(), Some("fresh"));
        assert_eq!(saved.refresh_token.as_deref(), Some("r1"));
        assert!(saved.expiry.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_failed_refresh_discards_token_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let path = write_token(
            &temp,
            serde_json::json!({
                "token": "stale",
                "refresh_token": "revoked",
                "token_uri": format!("{}/token", server.url()),
                "expiry": "2020-01-01T00:00:00Z"
            }),
        );
        let store = CredentialStore::new(path.clone(), "http://unused", Client::new());

        let err = store.access_token().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token() {
        let temp = TempDir::new().unwrap();
        let path = write_token(&temp, serde_json::json!({"token": "stale", "expiry": "2020-01-01T00:00:00Z"}));
        let store = CredentialStore::new(path.clone(), "http://unused", Client::new());

        let err = store.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::ReauthenticationRequired { .. }));
        assert!(path.exists());
    }
}
