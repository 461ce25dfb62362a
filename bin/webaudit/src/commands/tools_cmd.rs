use std::sync::Arc;

use webaudit_bridge::AutomationBridge;
use webaudit_core::{Config, Paths};

async fn load_procedures() -> anyhow::Result<Vec<webaudit_bridge::ProcedureDefinition>> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let bridge = Arc::new(AutomationBridge::new(config.mcp.clone()));
    bridge.start().await?;
    let procedures = bridge.procedures().await;
    bridge.stop().await;
    Ok(procedures)
}

/// List declared procedures with the allow-list marked.
pub async fn list() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let procedures = load_procedures().await?;

    println!("Declared procedures ({}):", procedures.len());
    for def in &procedures {
        let allowed = if config.audit.allowed_tools.contains(&def.name) {
            "*"
        } else {
            " "
        };
        let description = def.description.as_deref().unwrap_or("");
        println!("  {} {:<28} {}", allowed, def.name, description);
    }
    println!("\n(* = selectable by the audit model)");
    Ok(())
}

/// Dump full procedure definitions as JSON, for docs or external tooling.
pub async fn export() -> anyhow::Result<()> {
    let procedures = load_procedures().await?;
    println!("{}", serde_json::to_string_pretty(&procedures)?);
    Ok(())
}
