//! The audit pipeline: one constrained tool-selection call, bridged
//! procedure execution, then two analysis calls producing the combined
//! technical + executive report.
//!
//! Phase failures propagate per policy: per-invocation failures are recorded
//! and never abort the pipeline; the analyzing phase retries once then fails
//! the audit; the summarizing phase retries once then degrades to an
//! explicit "unavailable" summary.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use webaudit_bridge::{filter_capabilities, to_function_schemas, ProcedureDefinition, ProcedureInvoker};
use webaudit_core::config::AuditConfig;
use webaudit_core::types::ChatMessage;
use webaudit_core::{Error as CoreError, Result};
use webaudit_providers::Provider;

use crate::prompts;
use crate::report::{CombinedReport, ExecutiveSummary, TechnicalReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPhase {
    Selecting,
    Executing,
    Analyzing,
    Summarizing,
}

/// A single top-level failure naming the phase that sank the audit.
#[derive(Debug, Error)]
#[error("audit failed during {phase:?}: {source}")]
pub struct AuditFailure {
    pub phase: AuditPhase,
    #[source]
    pub source: CoreError,
}

/// One entry of the model's ordered selection.
#[derive(Debug, Clone)]
pub struct SelectedCall {
    pub name: String,
    pub args: Value,
}

/// Outcome of one procedure invocation, success or failure alike.
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    pub name: String,
    pub args: Value,
    pub outcome: std::result::Result<Value, String>,
    pub duration_ms: u64,
}

impl InvocationRecord {
    pub fn to_value(&self) -> Value {
        match &self.outcome {
            Ok(result) => json!({
                "procedure": self.name,
                "arguments": self.args,
                "result": result,
                "duration_ms": self.duration_ms,
            }),
            Err(error) => json!({
                "procedure": self.name,
                "arguments": self.args,
                "error": error,
                "duration_ms": self.duration_ms,
            }),
        }
    }
}

/// Procedures that only read already-established page state and may run
/// concurrently. Anything else (navigation, emulation, tracing, input) is
/// treated as mutating and serialized in selection order.
const READ_ONLY_PROCEDURES: &[&str] = &[
    "take_screenshot",
    "take_snapshot",
    "list_network_requests",
    "list_console_messages",
    "list_pages",
];

fn is_read_only(name: &str) -> bool {
    READ_ONLY_PROCEDURES.contains(&name)
}

pub struct AuditOrchestrator {
    invoker: Arc<dyn ProcedureInvoker>,
    provider: Arc<dyn Provider>,
    config: AuditConfig,
}

impl AuditOrchestrator {
    pub fn new(
        invoker: Arc<dyn ProcedureInvoker>,
        provider: Arc<dyn Provider>,
        config: AuditConfig,
    ) -> Self {
        Self {
            invoker,
            provider,
            config,
        }
    }

    /// Run one complete audit for a target URL.
    pub async fn run_audit(&self, url: &str) -> std::result::Result<CombinedReport, AuditFailure> {
        info!(url, "Starting web audit");

        let capabilities =
            filter_capabilities(&self.invoker.procedures().await, &self.config.allowed_tools);
        info!(capabilities = capabilities.len(), "Capability set reduced");

        let selected = self
            .select_procedures(url, &capabilities)
            .await
            .map_err(|source| AuditFailure {
                phase: AuditPhase::Selecting,
                source,
            })?;

        let raw_results = self.execute_selected(selected).await;
        let failed = raw_results.iter().filter(|r| r.outcome.is_err()).count();
        info!(
            total = raw_results.len(),
            failed, "Procedure execution complete"
        );

        let technical = self
            .analyze(url, &raw_results)
            .await
            .map_err(|source| AuditFailure {
                phase: AuditPhase::Analyzing,
                source,
            })?;

        let summary = match self.summarize(&technical).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Executive summary unavailable, degrading");
                ExecutiveSummary::unavailable()
            }
        };

        info!(url, "Audit complete");
        Ok(CombinedReport::assemble(url, technical, summary))
    }

    /// Phase 1: let the model pick procedures, constrained to the reduced
    /// capability set. Selections outside the set are dropped, not fatal.
    async fn select_procedures(
        &self,
        url: &str,
        capabilities: &[ProcedureDefinition],
    ) -> Result<Vec<SelectedCall>> {
        let schemas = to_function_schemas(capabilities);
        let messages = vec![
            ChatMessage::system(prompts::web_audit_expert()),
            ChatMessage::user(&prompts::tool_selection(url)),
        ];

        let response = self.provider.chat(&messages, &schemas).await?;

        let allowed: HashSet<&str> = capabilities.iter().map(|d| d.name.as_str()).collect();
        let mut selected = Vec::new();
        for call in response.tool_calls {
            if allowed.contains(call.name.as_str()) {
                selected.push(SelectedCall {
                    name: call.name,
                    args: call.arguments,
                });
            } else {
                warn!(procedure = %call.name, "Model selected a procedure outside the capability set, dropping");
            }
        }

        if selected.is_empty() {
            warn!("Model selected no procedures; proceeding with empty results");
        } else {
            info!(count = selected.len(), "Procedures selected");
        }
        Ok(selected)
    }

    /// Phase 2: run the selection in order. Consecutive read-only calls run
    /// concurrently up to the configured fan-out; mutating calls act as
    /// barriers and run alone.
    pub(crate) async fn execute_selected(&self, selected: Vec<SelectedCall>) -> Vec<InvocationRecord> {
        let mut records = Vec::with_capacity(selected.len());
        let mut batch: Vec<SelectedCall> = Vec::new();

        for call in selected {
            if is_read_only(&call.name) {
                batch.push(call);
                continue;
            }
            records.extend(self.run_batch(std::mem::take(&mut batch)).await);
            records.push(self.run_one(call).await);
        }
        records.extend(self.run_batch(batch).await);
        records
    }

    async fn run_batch(&self, batch: Vec<SelectedCall>) -> Vec<InvocationRecord> {
        if batch.is_empty() {
            return Vec::new();
        }
        let fan_out = self.config.tool_fan_out.max(1);
        futures::stream::iter(batch.into_iter().map(|call| self.run_one(call)))
            .buffered(fan_out)
            .collect()
            .await
    }

    /// One invocation with a single orchestrator-owned retry. The bridge
    /// itself never retries.
    async fn run_one(&self, call: SelectedCall) -> InvocationRecord {
        let start = Instant::now();
        let mut outcome = self.invoker.invoke(&call.name, call.args.clone()).await;

        if let Err(e) = &outcome {
            let retryable = matches!(
                e,
                CoreError::Timeout(_) | CoreError::Tool(_) | CoreError::Rpc { .. }
            );
            if retryable {
                warn!(procedure = %call.name, error = %e, "Invocation failed, retrying once");
                outcome = self.invoker.invoke(&call.name, call.args.clone()).await;
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => info!(procedure = %call.name, duration_ms, "Procedure completed"),
            Err(e) => error!(procedure = %call.name, duration_ms, error = %e, "Procedure failed"),
        }

        InvocationRecord {
            name: call.name,
            args: call.args,
            outcome: outcome.map_err(|e| e.to_string()),
            duration_ms,
        }
    }

    /// Phase 3: structured technical report; retry once on schema failure,
    /// then fail the audit.
    async fn analyze(&self, url: &str, raw_results: &[InvocationRecord]) -> Result<TechnicalReport> {
        let prompt = prompts::analysis(url, raw_results);
        match self.structured_call::<TechnicalReport>(&prompt).await {
            Ok(report) => Ok(report),
            Err(first) => {
                warn!(error = %first, "Technical report failed validation, retrying once");
                let retry_prompt = format!("{}{}", prompt, prompts::SCHEMA_REMINDER);
                self.structured_call::<TechnicalReport>(&retry_prompt)
                    .await
                    .map_err(|second| {
                        CoreError::AnalysisFailed(format!(
                            "technical report invalid after retry: {}",
                            second
                        ))
                    })
            }
        }
    }

    /// Phase 4: executive summary; retry once, then the caller degrades.
    async fn summarize(&self, report: &TechnicalReport) -> Result<ExecutiveSummary> {
        let prompt = prompts::executive_summary(report);
        match self.structured_call::<ExecutiveSummary>(&prompt).await {
            Ok(summary) => Ok(summary),
            Err(first) => {
                warn!(error = %first, "Executive summary failed validation, retrying once");
                let retry_prompt = format!("{}{}", prompt, prompts::SCHEMA_REMINDER);
                self.structured_call::<ExecutiveSummary>(&retry_prompt).await
            }
        }
    }

    /// One model call whose content must deserialize into `T`.
    async fn structured_call<T: DeserializeOwned>(&self, prompt: &str) -> Result<T> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self.provider.chat(&messages, &[]).await?;
        let content = response
            .content
            .ok_or_else(|| CoreError::SchemaValidation("model returned no content".to_string()))?;
        let payload = extract_json(&content);
        serde_json::from_str(payload).map_err(|e| {
            let preview: String = content.chars().take(200).collect();
            CoreError::SchemaValidation(format!("{}; content: {}", e, preview))
        })
    }
}

/// Models often wrap JSON in markdown fences or prose; slice out the
/// outermost object before parsing.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
