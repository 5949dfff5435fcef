//! commitscribe - CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use commitscribe::config::load_template;
use commitscribe::git::GitProvider;
use commitscribe::llm::summarize_error;
use commitscribe::{
    Backend, ClaudeCliConfig, CommitMessageService, ContextAggregator, ExclusionRules,
    GenerateError, GenerateRequest, Locale, PromptSettings, TaskInfo,
};

/// Write commit messages for pending changes using Claude.
#[derive(Parser, Debug)]
#[command(name = "commitscribe")]
#[command(about = "Write commit messages for pending changes using Claude")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a commit message for the pending changes
    Generate(GenerateArgs),
    /// Check that the Claude CLI is reachable and answers
    Verify(BackendArgs),
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Path to the claude executable (default: search PATH)
    #[arg(long)]
    cli_path: Option<String>,

    /// Model to ask for (default: the CLI's own default)
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait for the CLI before killing it
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    backend: BackendArgs,

    /// Repository to include (repeatable, default: current directory)
    #[arg(long = "repo")]
    repos: Vec<PathBuf>,

    /// Also describe the changes of the last commit, which is being amended
    #[arg(long)]
    amend: bool,

    /// Extra guidance for the message
    #[arg(long)]
    hint: Option<String>,

    /// File holding a prompt template
    #[arg(long)]
    template: Option<PathBuf>,

    /// Number of recent commit messages to include
    #[arg(long)]
    previous_commits: Option<usize>,

    /// Language of the message, as a locale tag (e.g. en, de-AT)
    #[arg(long)]
    locale: Option<String>,

    /// Glob of paths to leave out (repeatable)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Id of the task being worked on
    #[arg(long)]
    task_id: Option<String>,

    /// Summary of the task being worked on
    #[arg(long, requires = "task_id")]
    task_summary: Option<String>,

    /// Description of the task being worked on
    #[arg(long, requires = "task_id")]
    task_description: Option<String>,

    /// Seconds spent on the task so far
    #[arg(long, requires = "task_id")]
    task_time_spent: Option<u64>,

    /// Print the prompt instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the message.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Verify(args) => verify(args).await,
    }
}

fn cli_config(args: BackendArgs) -> ClaudeCliConfig {
    let mut config = ClaudeCliConfig::from_env();
    if let Some(path) = args.cli_path {
        config.executable_path = path;
    }
    if let Some(model) = args.model {
        config.model_id = model;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    config
}

fn prompt_settings(args: &GenerateArgs) -> Result<PromptSettings> {
    let mut settings = PromptSettings::from_env().context("Invalid settings in environment")?;

    if let Some(path) = &args.template {
        settings.template = load_template(path)?;
    }
    if let Some(count) = args.previous_commits {
        settings.previous_commit_count = count;
    }
    if let Some(locale) = &args.locale {
        settings.locale = Locale::parse(locale);
    }
    if !args.excludes.is_empty() {
        settings.exclusions = ExclusionRules::new(&args.excludes)?;
    }
    Ok(settings)
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let settings = prompt_settings(&args)?;

    let repos = if args.repos.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.repos.clone()
    };
    let provider = GitProvider::discover(&repos).context(
        "Not a git repository. Run commitscribe from within a git repository or pass --repo.",
    )?;

    let task = args.task_id.clone().map(|id| TaskInfo {
        id,
        summary: args.task_summary.clone().unwrap_or_default(),
        description: args.task_description.clone(),
        time_spent: Duration::from_secs(args.task_time_spent.unwrap_or(0)),
    });
    let request = GenerateRequest {
        changes: None,
        amend: args.amend,
        hint: args.hint.clone(),
        task,
    };

    let dry_run = args.dry_run;
    let backend = Backend::ClaudeCli(cli_config(args.backend));
    let service = Arc::new(CommitMessageService::new(
        ContextAggregator::new(Arc::new(provider)),
        backend,
        settings,
    ));

    if dry_run {
        return match service.prepare(&request).await {
            Ok(prepared) => {
                println!("{}", prepared.prompt);
                Ok(())
            }
            Err(GenerateError::EmptyDiff) => {
                println!("No changes to commit. Nothing to describe.");
                Ok(())
            }
            Err(e) => Err(e).context("Failed to build prompt"),
        };
    }

    eprintln!("Generating commit message with {}...", service.backend().name());

    let job = Arc::clone(&service).spawn(request);
    let canceller = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                service.cancel_current();
            }
        })
    };
    let result = job.await.context("Generation task failed")?;
    canceller.abort();

    match result {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(GenerateError::EmptyDiff) => {
            println!("No changes to commit. Nothing to describe.");
            Ok(())
        }
        Err(GenerateError::Backend(err)) => {
            let summary = summarize_error(&err);
            Err(anyhow::Error::new(err).context(summary))
        }
        Err(e) => Err(e).context("Failed to generate commit message"),
    }
}

async fn verify(args: BackendArgs) -> Result<()> {
    let backend = Backend::ClaudeCli(cli_config(args));
    let status = backend.verify().await;

    if status.is_valid() {
        println!("✓ {}", status.label());
        Ok(())
    } else {
        eprintln!("{}", status.label());
        std::process::exit(1);
    }
}
