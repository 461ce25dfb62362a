use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Settings for the audit pipeline and its model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Procedure names the model is allowed to select from. Names the
    /// subprocess does not actually declare are ignored.
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,
    /// Upper bound on concurrently issued read-only procedure invocations.
    #[serde(default = "default_tool_fan_out")]
    pub tool_fan_out: usize,
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,
    /// Explicit provider name; inferred from the model prefix when unset.
    #[serde(default)]
    pub provider: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_allowed_tools() -> Vec<String> {
    [
        "navigate_page",
        "performance_start_trace",
        "performance_stop_trace",
        "evaluate_script",
        "take_snapshot",
        "list_network_requests",
        "emulate_network",
        "list_console_messages",
        "take_screenshot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_tool_fan_out() -> usize {
    4
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            allowed_tools: default_allowed_tools(),
            tool_fan_out: default_tool_fan_out(),
            llm_timeout_secs: default_llm_timeout(),
            provider: None,
        }
    }
}

/// Settings for the browser-automation subprocess and its RPC handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpConfig {
    #[serde(default = "default_mcp_command")]
    pub command: String,
    #[serde(default = "default_mcp_package")]
    pub package: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub isolated: bool,
    /// Seconds to wait before probing the subprocess with `initialize`.
    /// Its readiness is not observable except by probing it.
    #[serde(default = "default_startup_grace")]
    pub startup_grace_secs: u64,
    #[serde(default = "default_init_timeout")]
    pub init_timeout_secs: u64,
    /// Per-invocation deadline for `tools/call` requests.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

fn default_mcp_command() -> String {
    "npx".to_string()
}

fn default_mcp_package() -> String {
    "chrome-devtools-mcp@latest".to_string()
}

fn default_true() -> bool {
    true
}

fn default_startup_grace() -> u64 {
    2
}

fn default_init_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

fn default_protocol_version() -> String {
    "2024-11-05".to_string()
}

fn default_client_name() -> String {
    "webaudit".to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            command: default_mcp_command(),
            package: default_mcp_package(),
            headless: default_true(),
            isolated: default_true(),
            startup_grace_secs: default_startup_grace(),
            init_timeout_secs: default_init_timeout(),
            request_timeout_secs: default_request_timeout(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
        }
    }
}

impl McpConfig {
    /// Argument vector passed to `command` when spawning the subprocess.
    pub fn server_args(&self) -> Vec<String> {
        vec![
            "-y".to_string(),
            self.package.clone(),
            format!("--headless={}", self.headless),
            format!("--isolated={}", self.isolated),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    9000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// API keys from the environment win over the config file, so secrets
    /// can stay out of it entirely.
    fn apply_env_overrides(&mut self) {
        for (name, var) in [("openai", "OPENAI_API_KEY"), ("anthropic", "ANTHROPIC_API_KEY")] {
            if let Ok(key) = std::env::var(var) {
                if !key.is_empty() {
                    self.providers.entry(name.to_string()).or_default().api_key = key;
                }
            }
        }
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.audit.model, "gpt-4o-mini");
        assert_eq!(cfg.audit.tool_fan_out, 4);
        assert_eq!(cfg.mcp.command, "npx");
        assert_eq!(cfg.mcp.startup_grace_secs, 2);
        assert_eq!(cfg.gateway.port, 9000);
        assert!(cfg.audit.allowed_tools.contains(&"navigate_page".to_string()));
        assert_eq!(cfg.audit.allowed_tools.len(), 9);
    }

    #[test]
    fn test_server_args() {
        let mcp = McpConfig::default();
        let args = mcp.server_args();
        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "chrome-devtools-mcp@latest");
        assert!(args.contains(&"--headless=true".to_string()));
        assert!(args.contains(&"--isolated=true".to_string()));
    }

    #[test]
    fn test_partial_override() {
        let raw = r#"{
  "audit": { "model": "claude-3-5-sonnet", "toolFanOut": 2 },
  "mcp": { "headless": false }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.audit.model, "claude-3-5-sonnet");
        assert_eq!(cfg.audit.tool_fan_out, 2);
        assert!(!cfg.mcp.headless);
        // untouched fields keep defaults
        assert_eq!(cfg.audit.llm_timeout_secs, 120);
        assert!(cfg.mcp.isolated);
    }

    #[test]
    fn test_roundtrip() {
        let cfg = Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.audit.model, cfg.audit.model);
        assert_eq!(back.mcp.request_timeout_secs, cfg.mcp.request_timeout_secs);
    }
}
