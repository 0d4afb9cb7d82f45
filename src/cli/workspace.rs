use super::WorkspaceCommand;
use crate::bootstrap::Runtime;
use crate::config::AppConfig;
use anyhow::Result;

pub async fn run(config: AppConfig, command: WorkspaceCommand) -> Result<()> {
    let runtime = Runtime::open(config).await?;

    match command {
        WorkspaceCommand::Set { path } => {
            let root = runtime.set_workspace(&path).await?;
            println!("📁 Workspace set to {}", root.display());
        }
        WorkspaceCommand::Show => match (runtime.workspace.current(), runtime.workspace.stored()) {
            (Some(root), _) => println!("📁 {}", root.display()),
            (None, Some(stored)) => println!(
                "⚠️  {} is no longer a directory; operations will fail closed.",
                stored.display()
            ),
            (None, None) => println!("📁 No workspace set."),
        },
        WorkspaceCommand::Clear => {
            runtime.clear_workspace().await?;
            println!("📁 Workspace cleared.");
        }
    }
    Ok(())
}
