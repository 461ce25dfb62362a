pub mod bridge;
pub mod registry;
pub mod transport;

pub use bridge::{AutomationBridge, BridgeEvent, BridgeState, BridgeStatus, ProcedureInvoker};
pub use registry::{filter_capabilities, to_function_schemas, ProcedureDefinition};
