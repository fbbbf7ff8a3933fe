//! Synchronous facade over [`RunOrchestrator`].
//!
//! Each [`BlockingRunOrchestrator`] owns a current-thread tokio runtime and
//! blocks the calling thread on it. Do not call it from inside an async
//! context; tokio panics when a runtime is blocked on from within another.

use std::sync::Arc;

use futures::StreamExt;
use tokio::runtime::Runtime;

use crate::error::RunError;
use crate::orchestrator::{RunOrchestrator, RunOutcome, RunRequest, RunStream};
use crate::stream::DeltaAggregator;
use crate::tools::ToolOutputResolver;
use crate::types::{Message, StreamUpdate};

pub struct BlockingRunOrchestrator {
    inner: RunOrchestrator,
    runtime: Runtime,
}

impl std::fmt::Debug for BlockingRunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRunOrchestrator")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl BlockingRunOrchestrator {
    pub fn new(inner: RunOrchestrator) -> Result<Self, RunError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &RunOrchestrator {
        &self.inner
    }

    /// Blocking [`RunOrchestrator::run_to_completion`].
    pub fn run_to_completion(
        &self,
        request: RunRequest,
        resolver: &dyn ToolOutputResolver,
    ) -> Result<RunOutcome, RunError> {
        self.runtime
            .block_on(self.inner.run_to_completion(request, resolver))
    }

    /// Blocking [`RunOrchestrator::run_streaming`]; each `next()` blocks until
    /// the following update arrives.
    pub fn run_streaming(
        &self,
        request: RunRequest,
        resolver: Arc<dyn ToolOutputResolver>,
    ) -> BlockingRunStream<'_> {
        BlockingRunStream {
            runtime: &self.runtime,
            stream: self.inner.run_streaming(request, resolver),
        }
    }

    pub fn messages(&self, thread_id: &str) -> Result<Vec<Message>, RunError> {
        self.runtime.block_on(self.inner.messages(thread_id))
    }
}

/// Iterator over the updates of a streamed run.
pub struct BlockingRunStream<'a> {
    runtime: &'a Runtime,
    stream: RunStream,
}

impl BlockingRunStream<'_> {
    pub fn aggregated(&self) -> DeltaAggregator {
        self.stream.aggregated()
    }
}

impl Iterator for BlockingRunStream<'_> {
    type Item = Result<StreamUpdate, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next())
    }
}
