//! Email command classifier
//!
//! Decides whether a query asks for the task list to be emailed. Every
//! failure degrades to "not an email command".

use colored::Colorize;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::reply::complete_text;
use super::{AgentContext, ServiceReply};
use crate::llm::CompletionRequest;
use crate::prompts::{EMAIL_COMMAND, EmailCommandContext};

/// Classification of a user query
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmailCommand {
    #[serde(default)]
    pub send_email: bool,
    #[serde(default)]
    pub email_command: Option<String>,
}

impl EmailCommand {
    /// The "not an email command" default
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse the classifier's reply
    ///
    /// Accepts a bare JSON object or one wrapped in a Markdown code fence.
    pub fn parse(content: &str) -> Option<Self> {
        serde_json::from_str(strip_code_fence(content)).ok()
    }
}

/// Classifies queries as email-dispatch commands
#[derive(Clone)]
pub struct CommandClassifier {
    ctx: AgentContext,
}

impl CommandClassifier {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Classify `query`; never fails
    pub async fn classify(&self, query: &str) -> EmailCommand {
        debug!(%query, "classify: called");
        let context = EmailCommandContext {
            user_input: query.to_string(),
        };
        let system_prompt = match self.ctx.prompts.render(EMAIL_COMMAND, &context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "classify: prompt render failed");
                return EmailCommand::none();
            }
        };
        let request = CompletionRequest::single_turn(query, system_prompt, self.ctx.max_tokens);

        let content = match complete_text(self.ctx.llm.as_ref(), request, "email-command").await {
            ServiceReply::Ok(content) => content,
            ServiceReply::Malformed(_) | ServiceReply::TransportFailure(_) => return EmailCommand::none(),
        };

        match EmailCommand::parse(&content) {
            Some(command) => {
                info!(send_email = command.send_email, command = ?command.email_command, "classify: parsed");
                command
            }
            None => {
                warn!(%content, "classify: unparseable reply");
                println!("{}", "Error: Invalid response format from the AI agent.".red());
                EmailCommand::none()
            }
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
