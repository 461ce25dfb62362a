//! Newline-delimited JSON-RPC 2.0 framing for the subprocess stdio link.
//!
//! Pure framing: no correlation logic lives here. Malformed inbound lines
//! are logged and dropped; they never satisfy a pending call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// Fire-and-forget message with no id, so no response is expected.
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Serialize a request into a single newline-terminated frame.
pub fn encode_request(req: &JsonRpcRequest) -> webaudit_core::Result<String> {
    let mut line = serde_json::to_string(req)?;
    line.push('\n');
    Ok(line)
}

pub fn encode_notification(notif: &JsonRpcNotification) -> webaudit_core::Result<String> {
    let mut line = serde_json::to_string(notif)?;
    line.push('\n');
    Ok(line)
}

/// Parse one inbound line. Returns `None` for blank or malformed input;
/// malformed frames are logged, never treated as fatal.
pub fn decode_response(line: &str) -> Option<JsonRpcResponse> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonRpcResponse>(trimmed) {
        Ok(resp) => Some(resp),
        Err(e) => {
            let preview: String = trimmed.chars().take(200).collect();
            warn!(error = %e, frame = %preview, "Dropping malformed RPC frame");
            None
        }
    }
}
