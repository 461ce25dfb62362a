use webaudit_core::{Config, Paths};
use webaudit_providers::infer_provider_from_model;

/// Print the resolved configuration without starting anything.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config_path = paths.config_file();
    let config = Config::load_or_default(&paths)?;

    println!("Config file: {} ({})", config_path.display(),
        if config_path.exists() { "present" } else { "defaults" });

    let provider = config
        .audit
        .provider
        .as_deref()
        .or_else(|| infer_provider_from_model(&config.audit.model))
        .unwrap_or("unresolved");
    let has_key = config
        .get_provider(provider)
        .map(|p| !p.api_key.is_empty())
        .unwrap_or(false);

    println!("Model: {} (provider: {}, api key: {})",
        config.audit.model,
        provider,
        if has_key { "configured" } else { "MISSING" });
    println!("Subprocess: {} {}", config.mcp.command, config.mcp.server_args().join(" "));
    println!("Gateway: {}:{}", config.gateway.host, config.gateway.port);
    println!("Allowed tools ({}):", config.audit.allowed_tools.len());
    for name in &config.audit.allowed_tools {
        println!("  - {}", name);
    }
    Ok(())
}
