//! Planning resolver
//!
//! Produces the free-text plan the extractor mines for a task.

use colored::Colorize;
use eyre::{Context, Result};
use tracing::debug;

use super::reply::complete_text;
use super::{AgentContext, ServiceReply};
use crate::domain::Task;
use crate::llm::CompletionRequest;
use crate::prompts::{PLANNING, PlanningContext};

/// Asks the completion service what to do with a query
#[derive(Clone)]
pub struct PlanningResolver {
    ctx: AgentContext,
}

impl PlanningResolver {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    /// Get a plan for `query` given the current task list
    ///
    /// The plan is opaque text; a failed call means "no task this iteration".
    pub async fn plan(&self, query: &str, tasks: &[Task]) -> Result<ServiceReply<String>> {
        debug!(%query, task_count = tasks.len(), "plan: called");
        let context = PlanningContext {
            user_input: query.to_string(),
            current_tasks: serde_json::to_string(tasks).context("Failed to serialize current tasks")?,
        };
        let system_prompt = self.ctx.prompts.render(PLANNING, &context)?;
        let request = CompletionRequest::single_turn(query, system_prompt, self.ctx.max_tokens);

        let reply = complete_text(self.ctx.llm.as_ref(), request, "planning").await;
        if let ServiceReply::Ok(content) = &reply {
            println!("{}", format!("Planning Agent: {}", content).green());
        }
        Ok(reply)
    }
}
