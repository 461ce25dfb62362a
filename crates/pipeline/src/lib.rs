pub mod orchestrator;
pub mod prompts;
pub mod report;

pub use orchestrator::{AuditFailure, AuditOrchestrator, AuditPhase, InvocationRecord, SelectedCall};
pub use report::{CombinedReport, ExecutiveSummary, TechnicalReport};
