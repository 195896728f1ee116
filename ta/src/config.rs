//! TaskAgent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main TaskAgent configuration
///
/// Loaded once at startup and passed by reference to every constructor;
/// nothing in the crate reads settings from the process environment except
/// the two secrets named here (API key and recipient fallback).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text completion provider configuration
    pub llm: LlmConfig,

    /// Orchestrator and extractor behaviour
    pub agent: AgentConfig,

    /// Task list persistence
    pub storage: StorageConfig,

    /// Google API endpoints and credentials
    pub google: GoogleConfig,

    /// Calendar event placement
    pub calendar: CalendarConfig,

    /// Email summary settings
    pub notify: NotifyConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early in
    /// startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.agent.iterations == 0 {
            return Err(eyre::eyre!("agent.iterations must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .taskagent.yml
        let local_config = PathBuf::from(".taskagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/taskagent/taskagent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskagent").join("taskagent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".taskagent.yml")];
                if let Some(dir) = dirs::config_dir() {
                    paths.push(dir.join("taskagent").join("taskagent.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Text completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient (5xx / 408) failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Echo raw completion payloads to the console
    pub verbose: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_ms: 180_000,
            max_retries: 2,
            verbose: false,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("LLM API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

/// Orchestrator and extractor behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Planning passes before giving up on adding a task
    pub iterations: u32,

    /// Cap on due-date clarification rounds (unset means ask until a date parses)
    #[serde(rename = "max-clarifications")]
    pub max_clarifications: Option<u32>,

    /// Directory of `.pmt` files overriding the embedded prompts
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            iterations: 5,
            max_clarifications: None,
            prompts_dir: None,
        }
    }
}

/// Task list persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the task blob
    pub dir: PathBuf,

    /// Blob key (file `{key}.json`)
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            key: taskstore::DEFAULT_KEY.to_string(),
        }
    }
}

/// Google API endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Authorized-user token file
    #[serde(rename = "token-path")]
    pub token_path: PathBuf,

    /// Token endpoint used when the token file does not name one
    #[serde(rename = "token-uri")]
    pub token_uri: String,

    /// Calendar API base URL
    #[serde(rename = "calendar-base-url")]
    pub calendar_base_url: String,

    /// Gmail API base URL
    #[serde(rename = "gmail-base-url")]
    pub gmail_base_url: String,

    /// Calendar that receives task events
    #[serde(rename = "calendar-id")]
    pub calendar_id: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            calendar_base_url: "https://www.googleapis.com".to_string(),
            gmail_base_url: "https://gmail.googleapis.com".to_string(),
            calendar_id: "primary".to_string(),
        }
    }
}

/// Calendar event placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Offset of the zone naive due dates are localized to (Asia/Kolkata by default)
    #[serde(rename = "utc-offset-minutes")]
    pub utc_offset_minutes: i32,

    /// Minutes between event start and the due date
    #[serde(rename = "lead-minutes")]
    pub lead_minutes: i64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 330,
            lead_minutes: 30,
        }
    }
}

/// Email summary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Recipient address; takes precedence over the environment variable
    #[serde(rename = "recipient-email")]
    pub recipient_email: Option<String>,

    /// Environment variable consulted when `recipient-email` is unset
    #[serde(rename = "recipient-email-env")]
    pub recipient_email_env: String,

    /// Subject line of the summary email
    #[serde(rename = "email-subject")]
    pub email_subject: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient_email: None,
            recipient_email_env: "RECIPIENT_EMAIL".to_string(),
            email_subject: "My Todo Tasks".to_string(),
        }
    }
}

impl NotifyConfig {
    /// Resolve the summary recipient, if any
    pub fn recipient(&self) -> Option<String> {
        self.recipient_email
            .clone()
            .or_else(|| std::env::var(&self.recipient_email_env).ok())
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
    }
}
