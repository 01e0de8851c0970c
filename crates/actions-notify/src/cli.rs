use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::context::ContextOverrides;

/// actions-notify – post a GitHub Actions run summary to Slack
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the current workflow run to the webhook
    Notify {
        /// Repository owner (defaults to GITHUB_REPOSITORY_OWNER)
        #[arg(long)]
        owner: Option<String>,

        /// Full repository name, owner/repo (defaults to GITHUB_REPOSITORY)
        #[arg(long)]
        repository: Option<String>,

        /// Workflow run id (defaults to GITHUB_RUN_ID)
        #[arg(long)]
        run_id: Option<String>,

        /// Print the Slack payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print build information
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    pub fn context_overrides(&self) -> ContextOverrides {
        match self {
            Commands::Notify {
                owner,
                repository,
                run_id,
                ..
            } => ContextOverrides {
                owner: owner.clone(),
                repository: repository.clone(),
                run_id: run_id.clone(),
            },
            Commands::Version { .. } => ContextOverrides::default(),
        }
    }
}
