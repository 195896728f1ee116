//! TaskAgent - natural-language task manager
//!
//! Turns a free-text request into a task record with a resolved due date,
//! stores it in a JSON task list and mirrors it to Google Calendar, or emails
//! the whole list when asked to.
//!
//! # Pipeline
//!
//! 1. [`agent::CommandClassifier`] decides whether the query asks for email
//! 2. [`agent::PlanningResolver`] turns the query into a plan
//! 3. [`extract::TaskExtractor`] pulls a task out of the plan and resolves its
//!    due date (inline, via [`agent::SchedulingResolver`], or by asking)
//! 4. [`storage::TaskRepository`] persists the list
//! 5. [`notify::NotificationSink`] creates the event or sends the summary
//!
//! [`orchestrator::Orchestrator`] runs the whole sequence for one query.

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extract;
pub mod llm;
pub mod notify;
pub mod orchestrator;
pub mod prompts;
pub mod storage;

pub use config::Config;
pub use domain::{DueDate, Task, TaskList};
pub use orchestrator::{Orchestrator, RunOutcome};
