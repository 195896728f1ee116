//! Clarification providers
//!
//! The extractor asks a [`Clarifier`] for a due date when neither the plan
//! nor the scheduler produced one. `None` from a clarifier means the
//! provider went away; the extractor stops asking.

use async_trait::async_trait;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Source of free-text due date answers
#[async_trait]
pub trait Clarifier: Send + Sync {
    /// Ask `prompt` and wait for one line of input
    ///
    /// Returns `Ok(None)` when the provider is cancelled or closed.
    async fn ask(&self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive clarifier reading from the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleClarifier;

impl ConsoleClarifier {
    pub fn new() -> Self {
        Self
    }
}

/// Read one line from the terminal on a blocking thread
///
/// EOF (Ctrl-D) and interrupt (Ctrl-C) both yield `None`.
pub async fn read_line(prompt: &str) -> Result<Option<String>> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        match rl.readline(&prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("read_line: input closed");
                Ok(None)
            }
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    })
    .await?
}

#[async_trait]
impl Clarifier for ConsoleClarifier {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        read_line(prompt).await
    }
}

/// A question waiting for an external provider
#[derive(Debug)]
pub struct ClarificationRequest {
    pub prompt: String,
    pub reply: oneshot::Sender<String>,
}

/// Clarifier backed by a request/response channel
///
/// Dropping the receiving end, or dropping a request's reply sender,
/// cancels the clarification.
#[derive(Debug, Clone)]
pub struct ChannelClarifier {
    tx: mpsc::Sender<ClarificationRequest>,
}

impl ChannelClarifier {
    /// Create a clarifier and the receiver its provider should serve
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<ClarificationRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Clarifier for ChannelClarifier {
    async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        debug!(%prompt, "ChannelClarifier::ask: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = ClarificationRequest {
            prompt: prompt.to_string(),
            reply: reply_tx,
        };
        if self.tx.send(request).await.is_err() {
            debug!("ChannelClarifier::ask: provider gone");
            return Ok(None);
        }
        Ok(reply_rx.await.ok())
    }
}
