//! Convenience re-exports for common use.

pub use crate::blocking::BlockingRunOrchestrator;
pub use crate::client::AgentsClient;
pub use crate::config::{ClientConfig, OrchestratorConfig};
pub use crate::error::{Result, RunError};
pub use crate::orchestrator::{
    with_cleanup, CleanupTargets, RunOrchestrator, RunOutcome, RunRequest, RunStream,
};
pub use crate::service::{AgentAdministration, MessageService, RunService};
pub use crate::stream::DeltaAggregator;
pub use crate::tools::{FunctionTool, Tool, ToolArguments, ToolOutputResolver, ToolRegistry};
pub use crate::types::{
    Message, MessageDelta, RequiredToolCall, Run, RunOptions, RunStatus, StreamUpdate,
    ToolOutput,
};
