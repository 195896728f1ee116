use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use taskagent::agent::AgentContext;
use taskagent::cli::Cli;
use taskagent::config::Config;
use taskagent::extract::{ConsoleClarifier, read_line};
use taskagent::llm::create_client;
use taskagent::notify::GoogleSink;
use taskagent::orchestrator::Orchestrator;
use taskagent::storage::TaskRepository;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = taskagent::cli::get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(iterations) = cli.iterations {
        config.agent.iterations = iterations;
    }
    if cli.max_clarifications.is_some() {
        config.agent.max_clarifications = cli.max_clarifications;
    }
    config.validate()?;
    info!(model = %config.llm.model, iterations = config.agent.iterations, "TaskAgent loaded config");

    let query = match cli.query {
        Some(query) => query,
        None => match read_line("Enter your query: ").await? {
            Some(query) => query,
            None => {
                debug!("main: no query entered");
                return Ok(());
            }
        },
    };

    let llm = create_client(&config.llm).context("Failed to create completion client")?;
    let ctx = AgentContext::from_config(&config, llm);
    let repository = TaskRepository::from_config(&config.storage)?;
    let sink = Arc::new(GoogleSink::from_config(&config)?);
    let orchestrator = Orchestrator::new(&config, ctx, Arc::new(ConsoleClarifier::new()), repository, sink);

    let outcome = orchestrator.execute(&query).await?;
    info!(?outcome, "main: run finished");
    Ok(())
}
