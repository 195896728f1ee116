//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the three agents.
//!
//! Template loading chain:
//! 1. `{agent.prompts-dir}/{name}.pmt` (user override)
//! 2. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{EmailCommandContext, PlanningContext, PromptLoader, SchedulingContext};

/// Template names
pub const PLANNING: &str = "planning";
pub const EMAIL_COMMAND: &str = "email-command";
pub const SCHEDULING: &str = "scheduling";
