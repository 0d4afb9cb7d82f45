//! CLI module for Warden
//!
//! Provides commands:
//! - `chat`: interactive session with a terminal approval prompt
//! - `workspace`: set, show or clear the workspace root
//! - `audit`: tail or export the audit log
//! - `policy`: show, check or dry-run the policy

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod approval_prompt;
pub mod audit;
pub mod chat;
pub mod policy;
pub mod workspace;

/// Warden CLI
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Policy-gated local file and command agent")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive session (default)
    Chat {
        /// Set the workspace root before starting
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
    /// Manage the workspace root
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommand,
    },
    /// Inspect the audit log
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
    /// Inspect the policy
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// Set the workspace root
    Set {
        /// Directory to scope every operation to
        path: PathBuf,
    },
    /// Show the workspace root
    Show,
    /// Forget the workspace root
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Print the most recent entries
    Tail {
        /// Number of entries
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },
    /// Copy the current log to a file
    Export {
        /// Destination file
        dest: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Print the policy in force
    Show,
    /// Validate a policy document without loading it
    Check {
        /// Policy file (TOML, or JSON by extension)
        file: PathBuf,
    },
    /// Evaluate one tool call against the policy and workspace root
    Eval {
        /// Tool name
        #[arg(long)]
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::load_config()?;

    match cli.command {
        None => chat::run(config, None).await,
        Some(Commands::Chat { workspace }) => chat::run(config, workspace).await,
        Some(Commands::Workspace { command }) => workspace::run(config, command).await,
        Some(Commands::Audit { command }) => audit::run(config, command).await,
        Some(Commands::Policy { command }) => policy::run(config, command).await,
    }
}
