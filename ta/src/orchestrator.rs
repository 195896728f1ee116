//! Orchestrator - one run from query to notification
//!
//! Classifies the query, then either emails the task list or runs bounded
//! plan/extract passes until one task is added.

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use tracing::{debug, info, warn};

use crate::agent::{AgentContext, CommandClassifier, PlanningResolver, SchedulingResolver, ServiceReply};
use crate::config::Config;
use crate::domain::Task;
use crate::extract::{Clarifier, TaskExtractor};
use crate::notify::{NotificationSink, NotifyError, SummaryOutcome};
use crate::storage::TaskRepository;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A task was appended and saved
    TaskAdded(Task),
    /// Every pass ended without a task
    NoTaskAdded,
    /// The task list was emailed
    Emailed { count: usize, command: Option<String> },
    /// Email requested but the list is empty
    NothingToEmail,
    /// Email requested but not delivered
    EmailFailed,
}

/// Drives a single query through the pipeline
pub struct Orchestrator {
    classifier: CommandClassifier,
    planner: PlanningResolver,
    extractor: TaskExtractor,
    repository: TaskRepository,
    sink: Arc<dyn NotificationSink>,
    iterations: u32,
    email_subject: String,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        ctx: AgentContext,
        clarifier: Arc<dyn Clarifier>,
        repository: TaskRepository,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let extractor = TaskExtractor::new(
            SchedulingResolver::new(ctx.clone()),
            clarifier,
            config.agent.max_clarifications,
        );
        Self {
            classifier: CommandClassifier::new(ctx.clone()),
            planner: PlanningResolver::new(ctx),
            extractor,
            repository,
            sink,
            iterations: config.agent.iterations,
            email_subject: config.notify.email_subject.clone(),
        }
    }

    /// Run `query` to completion
    ///
    /// Only storage failures and a lost Google authorization are errors;
    /// everything else is reported and folded into the outcome.
    pub async fn execute(&self, query: &str) -> Result<RunOutcome> {
        debug!(%query, iterations = self.iterations, "execute: called");
        let mut tasks = self.repository.load()?;
        info!(count = tasks.len(), "execute: loaded tasks");

        let command = self.classifier.classify(query).await;
        if command.send_email {
            return self.email(&tasks, command.email_command).await;
        }

        for pass in 1..=self.iterations {
            debug!(pass, "execute: planning pass");
            let plan = match self.planner.plan(query, &tasks).await? {
                ServiceReply::Ok(plan) if !plan.trim().is_empty() => plan,
                _ => continue,
            };

            match self.extractor.extract(&plan).await? {
                Some(extraction) => {
                    let task = extraction.task;
                    tasks.push(task.clone());
                    self.repository.save(&tasks)?;
                    println!(
                        "{}",
                        format!("Final Response: {} (Due: {})", task.description, task.due_date).cyan()
                    );
                    info!(pass, source = ?extraction.source, "execute: task added");
                    self.notify_event(&task).await?;
                    return Ok(RunOutcome::TaskAdded(task));
                }
                None => println!("{}", "No new task was added.".red()),
            }
        }

        println!("{}", "No more tasks to add. Exiting loop.".yellow());
        Ok(RunOutcome::NoTaskAdded)
    }

    async fn email(&self, tasks: &[Task], command: Option<String>) -> Result<RunOutcome> {
        if tasks.is_empty() {
            println!("{}", "No tasks available to send to email.".yellow());
            return Ok(RunOutcome::NothingToEmail);
        }

        match self.sink.send_summary(&self.email_subject, tasks).await {
            Ok(SummaryOutcome::Sent { .. }) => {
                println!(
                    "{}",
                    format!(
                        "Tasks sent to email using the command: {}",
                        command.as_deref().unwrap_or("None")
                    )
                    .green()
                );
                Ok(RunOutcome::Emailed {
                    count: tasks.len(),
                    command,
                })
            }
            Ok(SummaryOutcome::NoRecipient) => Ok(RunOutcome::EmailFailed),
            Err(e) => {
                self.report(e, "Failed to send email")?;
                Ok(RunOutcome::EmailFailed)
            }
        }
    }

    async fn notify_event(&self, task: &Task) -> Result<()> {
        match self.sink.create_event(task).await {
            Ok(outcome) => {
                debug!(?outcome, "notify_event: done");
                Ok(())
            }
            Err(e) => self.report(e, "Failed to create calendar event"),
        }
    }

    /// Print a notification failure; escalate it only if it is fatal
    fn report(&self, e: NotifyError, what: &str) -> Result<()> {
        if e.is_fatal() {
            return Err(e.into());
        }
        warn!(error = %e, "{}", what);
        println!("{}", format!("{}: {}", what, e).red());
        Ok(())
    }
}
