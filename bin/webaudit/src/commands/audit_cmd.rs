use std::sync::Arc;

use tracing::info;
use webaudit_bridge::{AutomationBridge, ProcedureInvoker};
use webaudit_core::{Config, Paths};
use webaudit_pipeline::AuditOrchestrator;
use webaudit_providers::{create_provider, Provider};

/// One-shot audit: start the bridge, run the pipeline, print the report.
pub async fn run(url: &str) -> anyhow::Result<()> {
    super::validate_url(url)?;

    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let provider: Arc<dyn Provider> = Arc::from(create_provider(&config)?);

    let bridge = Arc::new(AutomationBridge::new(config.mcp.clone()));
    bridge.start().await?;

    let orchestrator = AuditOrchestrator::new(
        bridge.clone() as Arc<dyn ProcedureInvoker>,
        provider,
        config.audit.clone(),
    );

    let result = orchestrator.run_audit(url).await;
    bridge.stop().await;

    match result {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            info!(audit_id = %report.audit_id, "Audit finished");
            Ok(())
        }
        Err(failure) => Err(anyhow::Error::new(failure)),
    }
}
