use super::AuditCommand;
use crate::bootstrap::Runtime;
use crate::config::AppConfig;
use anyhow::{Context, Result};

pub async fn run(config: AppConfig, command: AuditCommand) -> Result<()> {
    let runtime = Runtime::open(config).await?;

    match command {
        AuditCommand::Tail { lines } => {
            for line in runtime.audit.recent_lines(lines).await? {
                println!("{}", line);
            }
        }
        AuditCommand::Export { dest } => {
            let bytes = runtime
                .audit
                .export(&dest)
                .await
                .with_context(|| format!("Failed to export to {}", dest.display()))?;
            println!("📤 Exported {} bytes to {}", bytes, dest.display());
        }
    }
    Ok(())
}
