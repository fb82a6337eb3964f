use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use wfrelay::logging::{LogFormat, init_logging};
use wfrelay::util::parse_duration;

mod cmd;

#[derive(Parser)]
#[command(name = "wfrelay")]
#[command(version, about = "Dispatch GitHub Actions workflows and follow them to completion")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trigger a workflow and stream its step progress until it finishes
    Run {
        /// Repository as owner/repo or a GitHub URL
        #[arg(long, env = "WFRELAY_REPO")]
        repo: String,

        /// Workflow file name (e.g. ci.yaml)
        #[arg(long)]
        workflow: String,

        /// Branch, tag or SHA to run on
        #[arg(long = "ref")]
        git_ref: String,

        /// Give up after this long (e.g. 90s, 30m, 2h). Overrides polling.max_duration_secs
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,

        /// Print the result as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and report warnings
    Validate,
    /// Create a default wfrelay.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format)?;

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run {
            repo,
            workflow,
            git_ref,
            timeout,
            json,
        } => {
            cmd::cmd_run(&cli, project_dir, repo, workflow, git_ref, *timeout, *json).await?;
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
