//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Variables for the planning prompt
#[derive(Debug, Clone, Serialize)]
pub struct PlanningContext {
    /// The raw user query
    pub user_input: String,
    /// Current task list serialized as JSON
    pub current_tasks: String,
}

/// Variables for the email command prompt
#[derive(Debug, Clone, Serialize)]
pub struct EmailCommandContext {
    pub user_input: String,
}

/// Variables for the scheduling prompt
#[derive(Debug, Clone, Serialize)]
pub struct SchedulingContext {
    /// Text to resolve (task description or clarification answer)
    pub task_description: String,
    /// Current local time, `YYYY-MM-DD HH:MM:SS`
    pub current_date: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `user_dir` before the embedded prompts
    pub fn new(user_dir: Option<PathBuf>) -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: user_dir.filter(|d| d.exists()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    // Prompts are plain text; HTML escaping would mangle the task JSON.
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{user_dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
