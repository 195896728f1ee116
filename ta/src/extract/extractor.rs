//! Task extractor
//!
//! Turns one free-text plan into at most one task. The due date is resolved
//! through a fixed ladder: the plan's own `Due:` line, then the scheduling
//! resolver on the description, then clarification rounds until a date
//! parses.

use std::sync::{Arc, LazyLock};

use chrono::NaiveDateTime;
use colored::Colorize;
use eyre::Result;
use regex::Regex;
use tracing::{debug, info, warn};

use super::clarify::Clarifier;
use super::due_date::parse_due_date;
use crate::agent::SchedulingResolver;
use crate::domain::{DueDate, NOT_SPECIFIED, Task};

/// Plan markers in priority order; the first one present is used
pub const TASK_MARKERS: [&str; 3] = ["Task added:", "Task:", "Action:"];

pub const CLARIFICATION_NOTICE: &str =
    "Due date is not provided. Please provide a specific due date or time for the task.";
pub const CLARIFICATION_PROMPT: &str =
    "Enter due date (format: YYYY-MM-DD HH:MM:SS or relative terms like 'tomorrow'): ";
pub const INVALID_DATE_NOTICE: &str = "Invalid date format. Please try again.";

static DUE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Due:\s*(.*)").expect("valid due regex"));

/// Where a task's due date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateSource {
    /// The plan's `Due:` line parsed
    Inline,
    /// The scheduling resolver resolved the description
    Scheduler,
    /// A clarification answer resolved after `attempts` rounds
    Clarification { attempts: u32 },
    /// Clarification was cancelled or hit its cap
    Abandoned { attempts: u32 },
}

/// A task together with how its due date was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub task: Task,
    pub source: DueDateSource,
}

/// Resolution state of one extraction
enum Stage {
    /// Try the `Due:` candidate from the plan
    Inline(Option<String>),
    /// Ask the scheduler about the description
    Scheduler,
    /// Unresolved; only a parsed answer (or cancellation) leaves this state
    Clarifying { attempts: u32 },
    Resolved(NaiveDateTime, DueDateSource),
    Abandoned { attempts: u32 },
}

/// Find the task description in a plan
///
/// Uses the highest-priority marker present and returns the text between it
/// and the marker's next occurrence (or the end of the plan), trimmed.
pub fn find_description(plan: &str) -> Option<&str> {
    let marker = TASK_MARKERS.iter().find(|m| plan.contains(*m))?;
    let start = plan.find(marker)? + marker.len();
    let rest = &plan[start..];
    let segment = rest.find(marker).map_or(rest, |end| &rest[..end]);
    Some(segment.trim())
}

/// Split a raw description into the description proper and its `Due:` text
///
/// The candidate comes from the first `Due:` fragment; every fragment is
/// removed from the description.
pub fn split_due(raw: &str) -> (String, Option<String>) {
    let candidate = DUE_FRAGMENT
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());
    let description = DUE_FRAGMENT.replace_all(raw, "").trim().to_string();
    (description, candidate)
}

/// Extracts tasks from plans
pub struct TaskExtractor {
    scheduler: SchedulingResolver,
    clarifier: Arc<dyn Clarifier>,
    max_clarifications: Option<u32>,
}

impl TaskExtractor {
    /// `max_clarifications: None` keeps asking until an answer parses
    pub fn new(scheduler: SchedulingResolver, clarifier: Arc<dyn Clarifier>, max_clarifications: Option<u32>) -> Self {
        Self {
            scheduler,
            clarifier,
            max_clarifications,
        }
    }

    /// Extract a task from `plan`
    ///
    /// `Ok(None)` means the plan names no task. Errors come only from prompt
    /// rendering or a broken clarifier, never from bad dates.
    pub async fn extract(&self, plan: &str) -> Result<Option<Extraction>> {
        println!("{}", format!("Plan received for extraction: {}", plan).blue());

        let Some(raw) = find_description(plan) else {
            info!("extract: no task marker in plan");
            return Ok(None);
        };
        let (description, candidate) = split_due(raw);
        if description.is_empty() {
            info!("extract: task marker without a description");
            return Ok(None);
        }
        debug!(%description, ?candidate, "extract: description found");
        println!("{}", format!("Task description: {}", description).blue());

        let mut stage = Stage::Inline(candidate);
        loop {
            stage = match stage {
                Stage::Inline(candidate) => self.try_inline(candidate.as_deref()),
                Stage::Scheduler => match self.schedule(&description).await? {
                    Some(ts) => Stage::Resolved(ts, DueDateSource::Scheduler),
                    None => Stage::Clarifying { attempts: 0 },
                },
                Stage::Clarifying { attempts } => self.clarify(attempts).await?,
                Stage::Resolved(ts, source) => {
                    info!(%description, due = %ts, ?source, "extract: due date resolved");
                    return Ok(Some(Extraction {
                        task: Task::new(description, DueDate::At(ts)),
                        source,
                    }));
                }
                Stage::Abandoned { attempts } => {
                    warn!(%description, attempts, "extract: due date left unspecified");
                    return Ok(Some(Extraction {
                        task: Task::new(description, DueDate::NotSpecified),
                        source: DueDateSource::Abandoned { attempts },
                    }));
                }
            };
        }
    }

    fn try_inline(&self, candidate: Option<&str>) -> Stage {
        let Some(candidate) = candidate else {
            return Stage::Scheduler;
        };
        match parse_due_date(candidate) {
            // The sentinel cannot parse, but the check stays explicit
            Ok(ts) if candidate != NOT_SPECIFIED => Stage::Resolved(ts, DueDateSource::Inline),
            Ok(_) => Stage::Scheduler,
            Err(e) => {
                debug!(%candidate, error = %e, "try_inline: inline due date rejected");
                Stage::Scheduler
            }
        }
    }

    async fn clarify(&self, attempts: u32) -> Result<Stage> {
        if let Some(max) = self.max_clarifications
            && attempts >= max
        {
            warn!(attempts, max, "clarify: clarification cap reached");
            return Ok(Stage::Abandoned { attempts });
        }

        println!("{}", CLARIFICATION_NOTICE.yellow());
        let Some(answer) = self.clarifier.ask(CLARIFICATION_PROMPT).await? else {
            info!(attempts, "clarify: clarifier cancelled");
            return Ok(Stage::Abandoned { attempts });
        };

        let attempts = attempts + 1;
        match self.schedule(&answer).await? {
            Some(ts) => Ok(Stage::Resolved(ts, DueDateSource::Clarification { attempts })),
            None => {
                println!("{}", INVALID_DATE_NOTICE.red());
                Ok(Stage::Clarifying { attempts })
            }
        }
    }

    /// Run `text` through the scheduler and parse what comes back
    async fn schedule(&self, text: &str) -> Result<Option<NaiveDateTime>> {
        let reply = self.scheduler.resolve(text).await?;
        Ok(reply.ok().and_then(|resolved| parse_due_date(&resolved).ok()))
    }
}
