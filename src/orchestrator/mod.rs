//! Driving remote runs from creation to a terminal status.
//!
//! [`RunOrchestrator`] offers two ways to follow a run: polling
//! ([`RunOrchestrator::run_to_completion`]) and streaming
//! ([`RunOrchestrator::run_streaming`]). Both resolve required tool calls
//! locally through a [`ToolOutputResolver`] and submit the outputs as one
//! batch per required action.

mod polling;
pub mod scope;
mod streaming;
mod tool_phase;
mod tracker;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::AgentsClient;
use crate::config::OrchestratorConfig;
use crate::error::RunError;
use crate::service::{MessageService, RunService};
use crate::tools::ToolOutputResolver;
use crate::types::{Message, MessageRole, Run, RunOptions};
use crate::util::timeout::with_timeout;

pub use scope::{with_cleanup, CleanupTargets};
pub use streaming::RunStream;

/// One run to drive: where it runs, how it is configured, and how the
/// caller can abort it.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub thread_id: String,
    pub options: RunOptions,
    pub cancel: CancellationToken,
}

impl RunRequest {
    pub fn new(thread_id: impl Into<String>, options: RunOptions) -> Self {
        Self {
            thread_id: thread_id.into(),
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// A handle that aborts this request when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// A completed run and its thread's messages, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub run: Run,
    pub messages: Vec<Message>,
}

impl RunOutcome {
    /// Text of the last agent message produced by this run.
    pub fn reply_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| {
                m.role == MessageRole::Agent
                    && m.run_id.as_deref().map_or(true, |id| id == self.run.id)
            })
            .map(Message::text)
    }
}

/// Drives runs against a [`RunService`] and lists results through a
/// [`MessageService`].
#[derive(Clone)]
pub struct RunOrchestrator {
    runs: Arc<dyn RunService>,
    messages: Arc<dyn MessageService>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for RunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RunOrchestrator {
    pub fn new(
        runs: Arc<dyn RunService>,
        messages: Arc<dyn MessageService>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            runs,
            messages,
            config,
        }
    }

    /// Use one HTTP client for both runs and messages.
    pub fn from_client(client: AgentsClient, config: OrchestratorConfig) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client, config)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Create a run, poll it to a terminal status answering every required
    /// action, then list the thread's messages.
    ///
    /// A run that ends `failed`, `cancelled` or `expired` is an error
    /// carrying the terminal snapshot; the thread's partial messages are
    /// still available through [`RunOrchestrator::messages`].
    pub async fn run_to_completion(
        &self,
        request: RunRequest,
        resolver: &dyn ToolOutputResolver,
    ) -> Result<RunOutcome, RunError> {
        let terminal =
            polling::poll_until_terminal(self.runs.as_ref(), &self.config, &request, resolver)
                .await?;
        let run = tracker::terminal_outcome(terminal)?;
        polling::ensure_active(&request.cancel)?;

        let messages = with_timeout(
            self.config.request_timeout(),
            self.messages.list_messages(&request.thread_id),
        )
        .await?;
        Ok(RunOutcome { run, messages })
    }

    /// Create a run and follow it through its update streams.
    ///
    /// Nothing happens until the returned stream is first polled. Dropping
    /// it stops the run from being driven without cancelling it remotely.
    pub fn run_streaming(
        &self,
        request: RunRequest,
        resolver: Arc<dyn ToolOutputResolver>,
    ) -> RunStream {
        streaming::stream_run(Arc::clone(&self.runs), self.config.clone(), request, resolver)
    }

    /// All messages of a thread, oldest first.
    pub async fn messages(&self, thread_id: &str) -> Result<Vec<Message>, RunError> {
        with_timeout(
            self.config.request_timeout(),
            self.messages.list_messages(thread_id),
        )
        .await
    }
}
