use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "triage")]
#[command(version, about = "Protocolized debugging sessions for GitHub issues")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Diagnostic service URL. Falls back to TRIAGE_SERVER_URL, then the local default.
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a debug session against a GitHub issue
    Debug {
        /// Issue URL, e.g. https://github.com/owner/repo/issues/42
        issue_url: String,
    },
    /// Create the .triage/ session directory and a sample issue payload
    Init,
    /// List archived sessions in this project
    Sessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    triage::logging::init();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Debug { issue_url } => {
            cmd::cmd_debug(&project_dir, issue_url, cli.server.clone(), cli.verbose).await?;
        }
        Commands::Init => {
            cmd::cmd_init(&project_dir)?;
        }
        Commands::Sessions => {
            cmd::cmd_sessions(&project_dir)?;
        }
    }

    Ok(())
}
