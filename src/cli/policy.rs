use super::PolicyCommand;
use crate::bootstrap::Runtime;
use crate::config::AppConfig;
use anyhow::{Context, Result};
use warden_policy::{PolicyConfig, ToolCall};

pub async fn run(config: AppConfig, command: PolicyCommand) -> Result<()> {
    match command {
        PolicyCommand::Show => {
            let path = config.policy_path();
            let policy = PolicyConfig::load(&path);
            println!("# {}", path.display());
            if policy.is_deny_all() {
                println!("# deny-all: nothing can run");
            }
            println!("{}", serde_json::to_string_pretty(&policy)?);
        }
        PolicyCommand::Check { file } => {
            let policy = PolicyConfig::try_load(&file)
                .with_context(|| format!("{} is not a usable policy", file.display()))?;
            println!(
                "✅ {} is valid: {} tool(s), {} executable(s), at most {} action(s) per turn",
                file.display(),
                policy.allowed_tools.len(),
                policy.allowed_executables.len(),
                policy.max_actions_per_turn
            );
        }
        PolicyCommand::Eval { tool, args } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let runtime = Runtime::open(config).await?;
            let root = runtime.workspace.current();
            let decision = runtime
                .policy
                .evaluate(&ToolCall::new(tool, arguments), root.as_deref());
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
    }
    Ok(())
}
