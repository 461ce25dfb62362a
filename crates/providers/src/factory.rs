use std::time::Duration;

use webaudit_core::Config;

use crate::{AnthropicProvider, OpenAIProvider, Provider};

/// Default api_base for OpenAI-compatible providers.
fn default_api_base(provider_name: &str) -> &'static str {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        _ => "https://api.openai.com/v1",
    }
}

/// Infer the provider name from the model string prefix.
/// `None` means no recognizable prefix.
pub fn infer_provider_from_model(model: &str) -> Option<&'static str> {
    if model.starts_with("anthropic/") || model.starts_with("claude-") {
        Some("anthropic")
    } else if model.starts_with("openai/")
        || model.starts_with("gpt-")
        || model.starts_with("o1")
        || model.starts_with("o3")
    {
        Some("openai")
    } else if model.starts_with("deepseek") {
        Some("deepseek")
    } else if model.starts_with("groq/") {
        Some("groq")
    } else {
        None
    }
}

/// Build the provider for the audit pipeline's model calls.
///
/// Resolution order: explicit `audit.provider` from config, then the model
/// prefix. A provider without an API key is a configuration error.
pub fn create_provider(config: &Config) -> anyhow::Result<Box<dyn Provider>> {
    let model = &config.audit.model;
    let effective = if let Some(explicit) = config.audit.provider.as_deref() {
        explicit
    } else if let Some(inferred) = infer_provider_from_model(model) {
        inferred
    } else {
        return Err(anyhow::anyhow!(
            "No LLM provider configured. Set audit.provider or use a recognized model prefix \
             (e.g. 'gpt-4o-mini', 'claude-3-5-sonnet')."
        ));
    };

    let provider_cfg = config.get_provider(effective).ok_or_else(|| {
        anyhow::anyhow!("Provider '{}' is not present in the providers section", effective)
    })?;
    if provider_cfg.api_key.is_empty() {
        return Err(anyhow::anyhow!("Provider '{}' has no API key", effective));
    }

    let timeout = Duration::from_secs(config.audit.llm_timeout_secs);
    let max_tokens = config.audit.max_tokens;
    let temperature = config.audit.temperature;

    match effective {
        "anthropic" => Ok(Box::new(AnthropicProvider::new(
            &provider_cfg.api_key,
            provider_cfg.api_base.as_deref(),
            model,
            max_tokens,
            temperature,
            timeout,
        )) as Box<dyn Provider>),
        name => {
            let api_base = provider_cfg
                .api_base
                .as_deref()
                .unwrap_or_else(|| default_api_base(name));
            Ok(Box::new(OpenAIProvider::new(
                &provider_cfg.api_key,
                Some(api_base),
                model,
                max_tokens,
                temperature,
                timeout,
            )) as Box<dyn Provider>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webaudit_core::config::ProviderConfig;

    fn config_with_key(provider: &str, model: &str) -> Config {
        let mut config = Config::default();
        config.audit.model = model.to_string();
        config.providers.insert(
            provider.to_string(),
            ProviderConfig {
                api_key: "test-key".to_string(),
                api_base: None,
            },
        );
        config
    }

    #[test]
    fn test_infer_provider_from_model() {
        assert_eq!(infer_provider_from_model("gpt-4o-mini"), Some("openai"));
        assert_eq!(infer_provider_from_model("claude-3-5-sonnet"), Some("anthropic"));
        assert_eq!(infer_provider_from_model("anthropic/claude-3-opus"), Some("anthropic"));
        assert_eq!(infer_provider_from_model("deepseek-chat"), Some("deepseek"));
        assert_eq!(infer_provider_from_model("mystery-model"), None);
    }

    #[test]
    fn test_create_provider_from_model_prefix() {
        let config = config_with_key("openai", "gpt-4o-mini");
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn test_create_provider_explicit_wins() {
        let mut config = config_with_key("anthropic", "gpt-4o-mini");
        config.audit.provider = Some("anthropic".to_string());
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn test_create_provider_missing_key_fails() {
        let mut config = Config::default();
        config.audit.model = "gpt-4o-mini".to_string();
        config.providers.insert("openai".to_string(), ProviderConfig::default());
        assert!(create_provider(&config).is_err());
    }

    #[test]
    fn test_create_provider_unknown_model_fails() {
        let config = config_with_key("openai", "mystery-model");
        assert!(create_provider(&config).is_err());
    }
}
