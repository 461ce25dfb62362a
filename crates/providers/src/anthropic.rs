use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};
use webaudit_core::types::{ChatMessage, LLMResponse, ToolCallRequest};
use webaudit_core::{Error, Result};

use crate::Provider;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicProvider {
    pub fn new(
        api_key: &str,
        api_base: Option<&str>,
        model: &str,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.to_string(),
            api_base: api_base
                .unwrap_or(ANTHROPIC_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    /// OpenAI schema `{type: "function", function: {name, description, parameters}}`
    /// becomes Anthropic's `{name, description, input_schema}`.
    fn convert_tools(tools: &[Value]) -> Vec<Value> {
        tools
            .iter()
            .filter_map(|tool| {
                let func = tool.get("function")?;
                let name = func.get("name")?.as_str()?;
                let description = func.get("description").and_then(|v| v.as_str()).unwrap_or("");
                let parameters = func.get("parameters").cloned().unwrap_or(json!({
                    "type": "object",
                    "properties": {}
                }));
                Some(json!({
                    "name": name,
                    "description": description,
                    "input_schema": parameters,
                }))
            })
            .collect()
    }

    /// Anthropic takes the system prompt as a top-level parameter and only
    /// user/assistant messages in the list.
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_text: Option<String> = None;
        let mut converted: Vec<Value> = Vec::new();

        for msg in messages {
            match msg.role.as_str() {
                "system" => {
                    system_text = Some(match system_text {
                        Some(existing) => format!("{}\n\n{}", existing, msg.content),
                        None => msg.content.clone(),
                    });
                }
                role => {
                    let role = if role == "assistant" { "assistant" } else { "user" };
                    converted.push(json!({ "role": role, "content": msg.content }));
                }
            }
        }

        (system_text, converted)
    }

    /// Strip the "anthropic/" prefix some configs carry on model names.
    fn normalize_model(model: &str) -> &str {
        model.strip_prefix("anthropic/").unwrap_or(model)
    }

    fn parse_response(raw_body: &str) -> Result<LLMResponse> {
        let resp: AnthropicResponse = serde_json::from_str(raw_body).map_err(|e| {
            Error::Provider(format!(
                "Failed to parse Anthropic response: {}. Body: {}",
                e,
                crate::truncate_at_char_boundary(raw_body, 500)
            ))
        })?;

        let mut text_parts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();

        for block in &resp.content {
            match block.block_type.as_str() {
                "text" => {
                    if let Some(text) = &block.text {
                        if !text.is_empty() {
                            text_parts.push(text.clone());
                        }
                    }
                }
                "tool_use" => {
                    if let (Some(id), Some(name)) = (&block.id, &block.name) {
                        tool_calls.push(ToolCallRequest {
                            id: id.clone(),
                            name: name.clone(),
                            arguments: block
                                .input
                                .clone()
                                .unwrap_or(Value::Object(serde_json::Map::new())),
                        });
                    }
                }
                _ => {}
            }
        }

        let finish_reason = match resp.stop_reason.as_deref() {
            Some("end_turn") => "stop".to_string(),
            Some("tool_use") => "tool_calls".to_string(),
            Some("max_tokens") => "length".to_string(),
            Some(other) => other.to_string(),
            None => "stop".to_string(),
        };

        Ok(LLMResponse {
            content: (!text_parts.is_empty()).then(|| text_parts.join("\n")),
            tool_calls,
            finish_reason,
            usage: resp.usage.unwrap_or(Value::Null),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<LLMResponse> {
        let url = format!("{}/messages", self.api_base);
        let model = Self::normalize_model(&self.model);

        let (system, anthropic_messages) = Self::convert_messages(messages);
        let anthropic_tools = Self::convert_tools(tools);

        let mut request = json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": anthropic_messages,
        });
        if let Some(sys) = &system {
            request["system"] = Value::String(sys.clone());
        }
        if !anthropic_tools.is_empty() {
            request["tools"] = Value::Array(anthropic_tools);
        }

        info!(
            url = %url,
            model = %model,
            tools_count = tools.len(),
            messages_count = messages.len(),
            "Calling Anthropic API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Anthropic request timed out: {}", e))
                } else {
                    Error::Provider(format!("Anthropic request failed: {}", e))
                }
            })?;

        let status = response.status();
        let raw_body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(status = %status, body = %raw_body, "Anthropic API error");
            return Err(Error::Provider(format!(
                "Anthropic API error {}: {}",
                status, raw_body
            )));
        }

        debug!(body_len = raw_body.len(), "Anthropic raw response");
        Self::parse_response(&raw_body)
    }
}
