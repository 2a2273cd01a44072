use anyhow::Result;
use clap::{Parser, Subcommand};

use branchflow::commands;
use branchflow::config;
use branchflow::error::FlowError;
use branchflow::git::{Git2Repository, GitOps};
use branchflow::ui::{logger, DialoguerPrompt};

#[derive(Parser)]
#[command(
    name = "branchflow",
    about = "Automate date-stamped release/dev/feature branch workflows",
    version
)]
struct Cli {
    #[arg(short, long, help = "Custom configuration file path", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new branch (Release, Dev, Feature)
    Create,
    /// Merge the current feature branch into the nearest dev or release branch
    Merge {
        /// Target environment (dev or release)
        target: String,
    },
    /// Merge the latest release baseline into the current feature branch
    Sync,
    /// Show the latest dev and release branches
    List {
        /// Number of branches per kind
        count: Option<usize>,
    },
}

/// The configured remote must exist before any workflow talks to it.
fn ensure_remote(git: &Git2Repository, remote: &str) -> branchflow::Result<()> {
    let remotes = git.list_remotes()?;
    if remotes.iter().any(|r| r.name == remote) {
        Ok(())
    } else {
        Err(FlowError::config(format!(
            "Remote '{}' is not configured for this repository",
            remote
        )))
    }
}

// Handled errors are logged, never propagated: the process always exits 0
// so a failed workflow does not tear down the caller's terminal session.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            logger::error(&format!("Error loading configuration: {}", err));
            return Ok(());
        }
    };

    let git = match Git2Repository::discover(&config.remote) {
        Ok(git) => git,
        Err(err) => {
            logger::error(&err.to_string());
            return Ok(());
        }
    };

    if let Err(err) = ensure_remote(&git, &config.remote) {
        logger::error(&err.to_string());
        return Ok(());
    }

    let prompt = DialoguerPrompt;

    match cli.command {
        Command::Create => commands::create::run(&git, &prompt, &config, None),
        Command::Merge { target } => commands::merge::run(&git, &prompt, &config, &target),
        Command::Sync => commands::sync::run(&git, &config),
        Command::List { count } => commands::list::run(&git, &config, count),
    }

    Ok(())
}
