//! Interactive chat session

use crate::bootstrap::{build_planner, Runtime};
use crate::config::AppConfig;
use anyhow::{Context, Result};
use inquire::{InquireError, Text};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use warden_core::{format_error_for_cli, ApprovalManager, Orchestrator, TurnStatus};

const HELP: &str = "Commands:
  /workspace [PATH]  show or set the workspace root
  /audit [N]         show the last N audit entries (default 10)
  /help              show this help
  /quit              leave";

pub async fn run(config: AppConfig, workspace: Option<PathBuf>) -> Result<()> {
    let runtime = Runtime::open(config).await?;
    runtime.record_policy_loaded().await?;

    if let Some(path) = workspace {
        runtime.set_workspace(&path).await?;
    }

    let planner = build_planner(&runtime.config.planner)?;
    let (manager, requests) = ApprovalManager::new();
    let manager = Arc::new(manager);
    let presenter = super::approval_prompt::spawn(manager.clone(), requests);

    let orchestrator = Orchestrator::new(
        planner,
        runtime.policy.clone(),
        runtime.workspace.clone(),
        manager,
        runtime.audit.clone(),
    )
    .with_config(runtime.config.orchestrator.clone());

    println!("🛡️  Warden v{}", env!("CARGO_PKG_VERSION"));
    if runtime.policy.config().is_deny_all() {
        println!("⚠️  No usable policy at {}; every action will be denied.", runtime.config.policy_path().display());
    }
    match runtime.workspace.current() {
        Some(root) => println!("📁 Workspace: {}", root.display()),
        None => println!("📁 No workspace set. Use /workspace PATH."),
    }
    println!("Type /help for commands.\n");

    loop {
        let line = tokio::task::spawn_blocking(|| Text::new("you>").prompt())
            .await
            .context("Prompt task failed")?;
        let line = match line {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&runtime, command).await? {
                break;
            }
            continue;
        }

        match orchestrator.process_message(line).await {
            Ok(outcome) => {
                let marker = match outcome.status {
                    TurnStatus::Completed if outcome.failed_count() == 0 => "✅",
                    TurnStatus::Completed => "⚠️",
                    TurnStatus::Clarifying => "❓",
                    TurnStatus::NoActions => "💤",
                    TurnStatus::Denied => "🛑",
                    TurnStatus::FailedClosed => "❌",
                };
                println!("{} {}\n", marker, outcome.reply);
            }
            Err(e) => {
                // The audit log could not record the failure; stop here
                eprint!("{}", format_error_for_cli(&e));
                presenter.abort();
                return Err(e.into());
            }
        }
    }

    presenter.abort();
    info!("Session ended");
    Ok(())
}

/// Handle a slash command. Returns `false` to leave the session.
async fn handle_command(runtime: &Runtime, command: &str) -> Result<bool> {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" | "q" => return Ok(false),
        "help" | "h" => println!("{}\n", HELP),
        "workspace" | "ws" => {
            let rest: Vec<&str> = parts.collect();
            if rest.is_empty() {
                match runtime.workspace.current() {
                    Some(root) => println!("📁 {}\n", root.display()),
                    None => println!("📁 No workspace set.\n"),
                }
            } else {
                let path = crate::config::expand_path(&rest.join(" "));
                match runtime.set_workspace(&path).await {
                    Ok(root) => println!("📁 Workspace set to {}\n", root.display()),
                    Err(e) => println!("❌ {:#}\n", e),
                }
            }
        }
        "audit" => {
            let n = parts.next().and_then(|n| n.parse().ok()).unwrap_or(10);
            for line in runtime.audit.recent_lines(n).await? {
                println!("{}", line);
            }
            println!();
        }
        other => println!("Unknown command '/{}'. Type /help.\n", other),
    }
    Ok(true)
}
