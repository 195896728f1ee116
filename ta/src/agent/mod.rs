//! Completion-backed agents
//!
//! Each agent renders one prompt, sends a single-turn request and interprets
//! the reply. None of them validate dates; that is the extractor's job.

mod classifier;
mod planner;
mod reply;
mod scheduler;

pub use classifier::{CommandClassifier, EmailCommand};
pub use planner::PlanningResolver;
pub use reply::ServiceReply;
pub use scheduler::SchedulingResolver;

use std::sync::Arc;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::prompts::PromptLoader;

/// Shared plumbing handed to every agent
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Arc<dyn LlmClient>,
    pub prompts: Arc<PromptLoader>,
    pub max_tokens: u32,
}

impl AgentContext {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Build the context from configuration and an existing client
    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>) -> Self {
        let prompts = PromptLoader::new(config.agent.prompts_dir.clone());
        Self::new(llm, Arc::new(prompts), config.llm.max_tokens)
    }
}
