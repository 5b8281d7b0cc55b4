use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "gavel")]
#[command(version, about = "Human review gate for pipeline phase output")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Directory of the key-value store. Overrides gavel.toml and GAVEL_STORE_DIR.
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Number of decisions kept in history. Overrides gavel.toml.
    #[arg(long, global = true)]
    pub history_capacity: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a .gavel directory in the project
    Init,
    /// Review a request read from a JSON file
    Review {
        /// Path to the review request (JSON)
        request: PathBuf,

        /// Decide without prompting: approve, reject or skip
        #[arg(long)]
        action: Option<String>,

        /// Edit a field before deciding (repeatable)
        #[arg(long = "edit", value_name = "FIELD=VALUE")]
        edits: Vec<String>,

        /// Reviewer commentary
        #[arg(long)]
        commentary: Option<String>,
    },
    /// Show or clear past review decisions
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,

        /// Show at most this many decisions
        #[arg(long)]
        limit: Option<usize>,

        /// Print decisions as JSON
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
pub enum HistoryCommands {
    /// Remove all recorded decisions
    Clear,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Store the review panel position
    Position {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
}

fn init_logging(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Review {
            request,
            action,
            edits,
            commentary,
        } => {
            cmd::cmd_review(
                &project_dir,
                &cli,
                request,
                action.as_deref(),
                edits,
                commentary.as_deref(),
            )
            .await?;
        }
        Commands::History {
            command,
            limit,
            json,
        } => cmd::cmd_history(&project_dir, &cli, command.clone(), *limit, *json)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, &cli, command.clone())?,
    }

    Ok(())
}
