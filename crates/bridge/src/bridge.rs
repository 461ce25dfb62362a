//! Lifecycle and request correlation for the browser-automation subprocess.
//!
//! The bridge owns the child process, its stdio transport, the declared
//! procedure registry and the pending-call table. Exactly one resolution is
//! delivered per request id: responses are matched by id, never by arrival
//! order, and late or duplicate responses are discarded.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use webaudit_core::config::McpConfig;
use webaudit_core::{Error, Result};

use crate::registry::ProcedureDefinition;
use crate::transport::{self, JsonRpcNotification, JsonRpcRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Starting,
    Ready,
    Degraded,
}

/// Lifecycle events delivered to whoever owns the bridge. The bridge only
/// reports; whether to restart after an exit is the owner's policy.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready,
    Error(String),
    Exit { code: Option<i32> },
}

/// Point-in-time snapshot used by health checks and the capability gate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    pub ready: bool,
    pub process_alive: bool,
    pub pending_count: usize,
}

/// Why a pending call was rejected before a normal result arrived.
#[derive(Debug, Clone)]
enum CallFailure {
    Rpc { code: i64, message: String },
    Terminated,
}

type CallResult = std::result::Result<Value, CallFailure>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<CallResult>>>>;

pub struct AutomationBridge {
    config: McpConfig,
    state: Arc<RwLock<BridgeState>>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    child: Arc<Mutex<Option<Child>>>,
    next_id: AtomicU64,
    pending: PendingMap,
    procedures: Arc<RwLock<Vec<ProcedureDefinition>>>,
    events: broadcast::Sender<BridgeEvent>,
}

impl AutomationBridge {
    pub fn new(config: McpConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(BridgeState::Stopped)),
            stdin: Arc::new(Mutex::new(None)),
            child: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            procedures: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    /// Spawn the subprocess and run the initialization handshake.
    ///
    /// The stdout reader and exit handling are wired up before any request
    /// is written, so there is no window in which a response can be missed.
    /// After the startup grace period the subprocess is probed with
    /// `initialize` followed by `tools/list`; success moves the bridge to
    /// `Ready`, failure or timeout to `Degraded`.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if *state != BridgeState::Stopped {
                warn!(state = ?*state, "Bridge already started, ignoring start()");
                return Ok(());
            }
            *state = BridgeState::Starting;
        }

        let mut cmd = Command::new(&self.config.command);
        cmd.args(self.config.server_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Err(e) = self.launch(cmd).await {
            *self.state.write().await = BridgeState::Degraded;
            let _ = self.events.send(BridgeEvent::Error(e.to_string()));
            return Err(e);
        }

        // The subprocess boots a browser; its readiness is not observable
        // except by probing it after a grace period.
        tokio::time::sleep(Duration::from_secs(self.config.startup_grace_secs)).await;

        let init_timeout = Duration::from_secs(self.config.init_timeout_secs);
        match self.handshake(init_timeout).await {
            Ok(count) => {
                *self.state.write().await = BridgeState::Ready;
                info!(procedures = count, "Automation bridge ready");
                let _ = self.events.send(BridgeEvent::Ready);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Automation bridge handshake failed");
                *self.state.write().await = BridgeState::Degraded;
                let _ = self.events.send(BridgeEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Spawn the child and register the stdout/stderr readers.
    async fn launch(&self, mut cmd: Command) -> Result<()> {
        let mut child = cmd.spawn().map_err(|e| {
            Error::Tool(format!("failed to spawn '{}': {}", self.config.command, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Tool("subprocess has no stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Tool("subprocess has no stdout".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(Self::stderr_task(stderr));
        }

        tokio::spawn(Self::reader_task(
            stdout,
            self.pending.clone(),
            self.state.clone(),
            self.events.clone(),
        ));

        *self.stdin.lock().await = Some(stdin);
        *self.child.lock().await = Some(child);
        Ok(())
    }

    /// `initialize` + `notifications/initialized` + `tools/list`.
    /// Returns the number of procedures the subprocess declared.
    async fn handshake(&self, timeout: Duration) -> Result<usize> {
        let params = json!({
            "protocolVersion": self.config.protocol_version,
            "capabilities": {},
            "clientInfo": {
                "name": self.config.client_name,
                "version": self.config.client_version,
            }
        });
        let result = self.call("initialize", Some(params), timeout).await?;
        debug!(?result, "Initialize handshake complete");

        let notif = JsonRpcNotification::new("notifications/initialized");
        let line = transport::encode_notification(&notif)?;
        if let Some(stdin) = self.stdin.lock().await.as_mut() {
            let _ = stdin.write_all(line.as_bytes()).await;
            let _ = stdin.flush().await;
        }

        let result = self.call("tools/list", None, timeout).await?;
        let defs: Vec<ProcedureDefinition> = serde_json::from_value(
            result.get("tools").cloned().unwrap_or(Value::Array(vec![])),
        )
        .map_err(|e| Error::Tool(format!("failed to parse tools/list result: {}", e)))?;

        let count = defs.len();
        *self.procedures.write().await = defs;
        Ok(count)
    }

    /// The declared procedure registry (empty until the bridge is ready).
    pub async fn procedures(&self) -> Vec<ProcedureDefinition> {
        self.procedures.read().await.clone()
    }

    /// Invoke a remote procedure and wait for its correlated response.
    ///
    /// Fails fast with `NotReady` unless the bridge is ready and the
    /// process is alive. A deadline overrun fails only this invocation;
    /// other pending calls are unaffected.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value> {
        {
            let state = *self.state.read().await;
            if state != BridgeState::Ready {
                return Err(Error::NotReady(format!(
                    "bridge is {:?}, cannot invoke '{}'",
                    state, name
                )));
            }
        }
        if !self.process_alive().await {
            return Err(Error::NotReady(format!(
                "subprocess is gone, cannot invoke '{}'",
                name
            )));
        }

        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let params = json!({ "name": name, "arguments": args });
        let result = self.call("tools/call", Some(params), timeout).await?;
        Self::unwrap_tool_result(name, result)
    }

    /// Send one JSON-RPC request and suspend until its response or deadline.
    async fn call(&self, method: &str, params: Option<Value>, timeout: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let req = JsonRpcRequest::new(id, method, params);
        let line = transport::encode_request(&req)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let write_result = {
            let mut guard = self.stdin.lock().await;
            match guard.as_mut() {
                Some(stdin) => {
                    let write = async {
                        stdin.write_all(line.as_bytes()).await?;
                        stdin.flush().await
                    };
                    write.await.map_err(|e| {
                        Error::ProcessTerminated(format!("write failed for '{}': {}", method, e))
                    })
                }
                None => Err(Error::NotReady("subprocess stdin unavailable".to_string())),
            }
        };
        if let Err(e) = write_result {
            // Never leave an entry behind for a request that was not sent.
            self.pending.lock().await.remove(&id);
            return Err(e);
        }
        debug!(id, method, "RPC request sent");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(CallFailure::Rpc { code, message }))) => Err(Error::Rpc { code, message }),
            Ok(Ok(Err(CallFailure::Terminated))) => Err(Error::ProcessTerminated(format!(
                "subprocess exited while '{}' (id {}) was pending",
                method, id
            ))),
            Ok(Err(_)) => Err(Error::ProcessTerminated(format!(
                "pending call for '{}' (id {}) was dropped",
                method, id
            ))),
            Err(_) => {
                // Remove the entry so a late response is discarded as stale.
                self.pending.lock().await.remove(&id);
                Err(Error::Timeout(format!(
                    "'{}' (id {}) exceeded {:?}",
                    method, id, timeout
                )))
            }
        }
    }

    /// MCP tool results arrive as `{content: [...], isError}`; flatten text
    /// blocks into a string and surface `isError` as an invocation error.
    fn unwrap_tool_result(name: &str, result: Value) -> Result<Value> {
        if result.get("isError").and_then(|v| v.as_bool()) == Some(true) {
            let msg = result
                .get("content")
                .and_then(|c| c.as_array())
                .and_then(|arr| arr.first())
                .and_then(|item| item.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or("procedure returned an error");
            return Err(Error::Tool(format!("{}: {}", name, msg)));
        }

        let content = result.get("content").cloned().unwrap_or(Value::Null);
        if let Some(arr) = content.as_array() {
            let text: String = arr
                .iter()
                .filter_map(|item| {
                    if item.get("type").and_then(|t| t.as_str()) == Some("text") {
                        item.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            if !text.is_empty() {
                return Ok(Value::String(text));
            }
        }
        Ok(content)
    }

    pub async fn status(&self) -> BridgeStatus {
        BridgeStatus {
            ready: *self.state.read().await == BridgeState::Ready,
            process_alive: self.process_alive().await,
            pending_count: self.pending.lock().await.len(),
        }
    }

    async fn process_alive(&self) -> bool {
        let mut guard = self.child.lock().await;
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Terminate the subprocess and clear in-memory state. Idempotent:
    /// stopping an already-stopped bridge is a no-op.
    pub async fn stop(&self) {
        let was_stopped = {
            let mut state = self.state.write().await;
            let prev = *state;
            *state = BridgeState::Stopped;
            prev == BridgeState::Stopped
        };

        {
            let mut map = self.pending.lock().await;
            for (_, tx) in map.drain() {
                let _ = tx.send(Err(CallFailure::Terminated));
            }
        }

        *self.stdin.lock().await = None;
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        self.procedures.write().await.clear();

        if !was_stopped {
            info!("Automation bridge stopped");
        }
    }

    /// Background task reading newline-delimited frames from stdout and
    /// resolving pending calls by id.
    async fn reader_task(
        stdout: ChildStdout,
        pending: PendingMap,
        state: Arc<RwLock<BridgeState>>,
        events: broadcast::Sender<BridgeEvent>,
    ) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => Self::dispatch_frame(&pending, &line).await,
                Ok(None) => {
                    debug!("Subprocess stdout closed");
                    Self::handle_process_exit(&pending, &state, &events, None).await;
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Subprocess read error");
                    Self::handle_process_exit(&pending, &state, &events, None).await;
                    break;
                }
            }
        }
    }

    /// Resolve at most one pending call for an inbound frame. Frames with
    /// unknown or stale ids are discarded; notifications are ignored.
    async fn dispatch_frame(pending: &PendingMap, line: &str) {
        let Some(resp) = transport::decode_response(line) else {
            return;
        };
        let Some(id) = resp.id else {
            debug!("Ignoring notification frame");
            return;
        };

        let mut map = pending.lock().await;
        match map.remove(&id) {
            Some(tx) => {
                let payload = match resp.error {
                    Some(err) => Err(CallFailure::Rpc {
                        code: err.code,
                        message: err.message,
                    }),
                    None => Ok(resp.result.unwrap_or(Value::Null)),
                };
                let _ = tx.send(payload);
            }
            None => {
                warn!(id, "Response for unknown or stale request id, discarding");
            }
        }
    }

    /// Bulk-reject every pending call after an unexpected subprocess exit
    /// and notify the owner. A stop()-initiated exit is already handled.
    async fn handle_process_exit(
        pending: &PendingMap,
        state: &Arc<RwLock<BridgeState>>,
        events: &broadcast::Sender<BridgeEvent>,
        code: Option<i32>,
    ) {
        {
            let mut st = state.write().await;
            if *st == BridgeState::Stopped {
                return;
            }
            *st = BridgeState::Degraded;
        }

        let drained = {
            let mut map = pending.lock().await;
            let count = map.len();
            for (_, tx) in map.drain() {
                let _ = tx.send(Err(CallFailure::Terminated));
            }
            count
        };
        if drained > 0 {
            warn!(count = drained, "Rejected pending calls after subprocess exit");
        }
        let _ = events.send(BridgeEvent::Exit { code });
    }

    async fn stderr_task(stderr: ChildStderr) {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "webaudit_bridge::subprocess", "{}", line);
        }
    }
}

/// Narrow invocation interface the audit pipeline depends on.
#[async_trait::async_trait]
pub trait ProcedureInvoker: Send + Sync {
    async fn invoke(&self, name: &str, args: Value) -> Result<Value>;
    async fn procedures(&self) -> Vec<ProcedureDefinition>;
}

#[async_trait::async_trait]
impl ProcedureInvoker for AutomationBridge {
    async fn invoke(&self, name: &str, args: Value) -> Result<Value> {
        AutomationBridge::invoke(self, name, args).await
    }

    async fn procedures(&self) -> Vec<ProcedureDefinition> {
        AutomationBridge::procedures(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> McpConfig {
        McpConfig::default()
    }

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    #[tokio::test]
    async fn test_invoke_when_stopped_is_not_ready() {
        let bridge = AutomationBridge::new(test_config());
        let err = bridge.invoke("navigate_page", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::NotReady(_)));
        assert_eq!(bridge.status().await.pending_count, 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let bridge = AutomationBridge::new(test_config());
        bridge.stop().await;
        bridge.stop().await;
        let status = bridge.status().await;
        assert!(!status.ready);
        assert!(!status.process_alive);
        assert_eq!(status.pending_count, 0);
    }

    #[tokio::test]
    async fn test_dispatch_resolves_exactly_once() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(1, tx);

        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","id":1,"result":{"ok":1}}"#)
            .await;
        let value = rx.await.unwrap().unwrap();
        assert_eq!(value["ok"], 1);
        assert!(pending.lock().await.is_empty());

        // A duplicate response for the same id is discarded, not applied twice.
        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","id":1,"result":{"ok":2}}"#)
            .await;
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_matches_by_id_not_arrival_order() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        pending.lock().await.insert(1, tx1);
        pending.lock().await.insert(2, tx2);

        // Responses arrive out of order.
        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","id":2,"result":"second"}"#)
            .await;
        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","id":1,"result":"first"}"#)
            .await;

        assert_eq!(rx1.await.unwrap().unwrap(), "first");
        assert_eq!(rx2.await.unwrap().unwrap(), "second");
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_rpc_error_rejects_call() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(5, tx);

        AutomationBridge::dispatch_frame(
            &pending,
            r#"{"jsonrpc":"2.0","id":5,"error":{"code":-32000,"message":"browser crashed"}}"#,
        )
        .await;
        match rx.await.unwrap() {
            Err(CallFailure::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "browser crashed");
            }
            other => panic!("expected rpc failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_ignores_malformed_and_notifications() {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (tx, mut rx) = oneshot::channel();
        pending.lock().await.insert(1, tx);

        AutomationBridge::dispatch_frame(&pending, "{garbage").await;
        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","method":"notifications/x"}"#)
            .await;
        AutomationBridge::dispatch_frame(&pending, r#"{"jsonrpc":"2.0","id":99,"result":null}"#)
            .await;

        // The pending call is untouched by all three frames.
        assert!(rx.try_recv().is_err());
        assert_eq!(pending.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_process_exit_rejects_all_pending() {
        let state = Arc::new(RwLock::new(BridgeState::Ready));
        let (events, mut event_rx) = broadcast::channel(4);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let mut receivers = Vec::new();
        for id in 1..=5u64 {
            let (tx, rx) = oneshot::channel();
            pending.lock().await.insert(id, tx);
            receivers.push(rx);
        }

        AutomationBridge::handle_process_exit(&pending, &state, &events, Some(1)).await;

        for rx in receivers {
            assert!(matches!(rx.await.unwrap(), Err(CallFailure::Terminated)));
        }
        assert!(pending.lock().await.is_empty());
        assert_eq!(*state.read().await, BridgeState::Degraded);
        assert!(matches!(event_rx.recv().await.unwrap(), BridgeEvent::Exit { code: Some(1) }));
    }

    #[tokio::test]
    async fn test_call_roundtrip_against_scripted_subprocess() {
        let bridge = AutomationBridge::new(test_config());
        // Fresh bridge allocates id 1 first; the script answers exactly that.
        bridge
            .launch(sh(
                r#"read line; printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"ok":true}}'; read rest"#,
            ))
            .await
            .unwrap();

        let value = bridge
            .call("ping", None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(bridge.status().await.pending_count, 0);
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_call_timeout_drains_pending_table() {
        let bridge = AutomationBridge::new(test_config());
        // The script swallows the request and never answers.
        bridge.launch(sh("read line; sleep 5")).await.unwrap();

        let err = bridge
            .call("ping", None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(bridge.status().await.pending_count, 0);
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_subprocess_exit_fails_inflight_call() {
        let bridge = AutomationBridge::new(test_config());
        // The script exits right after consuming the request.
        bridge.launch(sh("read line")).await.unwrap();
        *bridge.state.write().await = BridgeState::Ready;

        let err = bridge
            .call("ping", None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProcessTerminated(_)));
        assert_eq!(bridge.status().await.pending_count, 0);
        assert_eq!(*bridge.state.read().await, BridgeState::Degraded);
        bridge.stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_calls_each_resolve_exactly_once() {
        let bridge = Arc::new(AutomationBridge::new(test_config()));
        // Answers ids 1..=4 in reverse order after reading all four requests.
        bridge
            .launch(sh(
                r#"read a; read b; read c; read d;
                   printf '%s\n' '{"jsonrpc":"2.0","id":4,"result":4}';
                   printf '%s\n' '{"jsonrpc":"2.0","id":3,"result":3}';
                   printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":2}';
                   printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":1}';
                   read rest"#,
            ))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for expected in 1..=4u64 {
            let bridge = bridge.clone();
            handles.push(tokio::spawn(async move {
                // ids are handed out in spawn order because each call locks
                // stdin for the full write; the scripted responses come back
                // reversed, so correlation must be by id.
                let value = bridge.call("ping", None, Duration::from_secs(5)).await.unwrap();
                (expected, value)
            }));
            // Keep allocation order deterministic for the script.
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        for handle in handles {
            let (expected, value) = handle.await.unwrap();
            assert_eq!(value, json!(expected));
        }
        assert_eq!(bridge.status().await.pending_count, 0);
        bridge.stop().await;
    }

    #[test]
    fn test_unwrap_tool_result_text_blocks() {
        let result = json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "..."},
                {"type": "text", "text": "line two"}
            ]
        });
        let value = AutomationBridge::unwrap_tool_result("take_snapshot", result).unwrap();
        assert_eq!(value, json!("line one\nline two"));
    }

    #[test]
    fn test_unwrap_tool_result_is_error() {
        let result = json!({
            "isError": true,
            "content": [{"type": "text", "text": "navigation blocked"}]
        });
        let err = AutomationBridge::unwrap_tool_result("navigate_page", result).unwrap_err();
        assert!(err.to_string().contains("navigation blocked"));
    }

    #[test]
    fn test_unwrap_tool_result_non_text_content() {
        let result = json!({ "content": {"structured": 1} });
        let value = AutomationBridge::unwrap_tool_result("x", result).unwrap();
        assert_eq!(value["structured"], 1);
    }
}
