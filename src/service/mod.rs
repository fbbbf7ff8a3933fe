//! Remote collaborators the orchestrator drives.
//!
//! The orchestrator only consumes these traits; [`crate::client::AgentsClient`]
//! is the HTTP implementation, and tests use scripted in-memory ones.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::RunError;
use crate::types::{Message, Run, RunOptions, StreamUpdate, ToolOutput};

/// Ordered, single-pass feed of updates for one submit operation.
pub type UpdateStream = BoxStream<'static, Result<StreamUpdate, RunError>>;

/// Run lifecycle operations.
#[async_trait]
pub trait RunService: Send + Sync {
    async fn create_run(&self, thread_id: &str, options: &RunOptions) -> Result<Run, RunError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RunError>;

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, RunError>;

    /// Create a run and stream its progress.
    async fn create_run_stream(
        &self,
        thread_id: &str,
        options: &RunOptions,
    ) -> Result<UpdateStream, RunError>;

    /// Submit tool outputs and stream the continuation of the run.
    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<UpdateStream, RunError>;

    /// Ask the service to cancel a run. Never called by the orchestrator.
    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, RunError>;
}

/// Message retrieval.
#[async_trait]
pub trait MessageService: Send + Sync {
    /// All messages of a thread, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, RunError>;
}

/// Thread and agent teardown.
#[async_trait]
pub trait AgentAdministration: Send + Sync {
    async fn delete_thread(&self, thread_id: &str) -> Result<(), RunError>;

    async fn delete_agent(&self, agent_id: &str) -> Result<(), RunError>;
}
