//! Scheduling resolver
//!
//! Asks the completion service to turn a relative or vague date phrase into
//! an exact `YYYY-MM-DD HH:MM:SS` string.

use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use eyre::Result;
use tracing::debug;

use super::reply::complete_text;
use super::{AgentContext, ServiceReply};
use crate::domain::CANONICAL_FORMAT;
use crate::llm::CompletionRequest;
use crate::prompts::{SCHEDULING, SchedulingContext};

/// Resolves date phrases through the completion service
#[derive(Clone)]
pub struct SchedulingResolver {
    ctx: AgentContext,
}

impl SchedulingResolver {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Resolve `text` relative to the current local time
    pub async fn resolve(&self, text: &str) -> Result<ServiceReply<String>> {
        self.resolve_at(text, Local::now().naive_local()).await
    }

    /// Resolve `text` relative to `now`
    ///
    /// The reply is trimmed and returned verbatim, including a literal `None`;
    /// callers validate it with the due date parser.
    pub async fn resolve_at(&self, text: &str, now: NaiveDateTime) -> Result<ServiceReply<String>> {
        debug!(%text, %now, "resolve_at: called");
        let context = SchedulingContext {
            task_description: text.to_string(),
            current_date: now.format(CANONICAL_FORMAT).to_string(),
        };
        let system_prompt = self.ctx.prompts.render(SCHEDULING, &context)?;
        let request = CompletionRequest::single_turn(text, system_prompt, self.ctx.max_tokens);

        let reply = complete_text(self.ctx.llm.as_ref(), request, "scheduling").await;
        if let ServiceReply::Ok(content) = &reply {
            println!("{}", format!("Scheduling Agent: {}", content).green());
        }
        Ok(reply.map(|content| content.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::prompts::PromptLoader;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn resolver(mock: Arc<MockLlmClient>) -> SchedulingResolver {
        SchedulingResolver::new(AgentContext::new(mock, Arc::new(PromptLoader::embedded_only()), 500))
    }

    #[tokio::test]
    async fn test_resolve_trims_reply() {
        let mock = Arc::new(MockLlmClient::texts(["  2025-03-02 23:59:59\n"]));
        let now = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();

        let reply = resolver(mock.clone()).resolve_at("tomorrow", now).await.unwrap();

        assert_eq!(reply, ServiceReply::Ok("2025-03-02 23:59:59".to_string()));
        assert_eq!(mock.user_messages(), vec!["tomorrow"]);
        assert!(mock.system_prompts()[0].contains("2025-03-01 09:00:00"));
    }

    #[tokio::test]
    async fn test_resolve_returns_none_text_verbatim() {
        let mock = Arc::new(MockLlmClient::texts(["None"]));
        let reply = resolver(mock).resolve("call Bob").await.unwrap();
        assert_eq!(reply, ServiceReply::Ok("None".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_missing_choices_is_malformed() {
        let mock = Arc::new(MockLlmClient::new(vec![MockReply::MissingChoices]));
        let reply = resolver(mock).resolve("tomorrow").await.unwrap();
        assert!(matches!(reply, ServiceReply::Malformed(_)));
    }
}
