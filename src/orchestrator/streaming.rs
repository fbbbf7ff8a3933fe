//! Push-based driving: consume update streams, resubmitting on required actions.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::tool_phase::resolve_within;
use super::tracker::{terminal_outcome, RunTracker};
use super::RunRequest;
use crate::config::OrchestratorConfig;
use crate::error::RunError;
use crate::service::{RunService, UpdateStream};
use crate::stream::DeltaAggregator;
use crate::tools::ToolOutputResolver;
use crate::types::{RunStatus, StreamUpdate};
use crate::util::timeout::Deadline;

/// Updates of one streamed run, in arrival order.
///
/// Message deltas are also folded into an aggregator that restarts with each
/// stream the orchestrator opens; [`RunStream::aggregated`] snapshots it.
pub struct RunStream {
    inner: UpdateStream,
    aggregator: Arc<Mutex<DeltaAggregator>>,
}

impl RunStream {
    /// Snapshot of the content aggregated from the current stream.
    pub fn aggregated(&self) -> DeltaAggregator {
        lock(&self.aggregator).clone()
    }

    /// Concatenated text of every message aggregated so far.
    pub fn aggregated_text(&self) -> String {
        lock(&self.aggregator).full_text()
    }
}

impl std::fmt::Debug for RunStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunStream").finish_non_exhaustive()
    }
}

impl Stream for RunStream {
    type Item = Result<StreamUpdate, RunError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

fn lock(aggregator: &Mutex<DeltaAggregator>) -> MutexGuard<'_, DeltaAggregator> {
    aggregator.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn stream_run(
    runs: Arc<dyn RunService>,
    config: OrchestratorConfig,
    request: RunRequest,
    resolver: Arc<dyn ToolOutputResolver>,
) -> RunStream {
    let aggregator = Arc::new(Mutex::new(DeltaAggregator::new()));
    let shared = Arc::clone(&aggregator);

    let inner = async_stream::stream! {
        let deadline = Deadline::new(config.max_wait());
        let thread_id = request.thread_id.clone();
        let mut tracker = RunTracker::new();

        let opened = deadline
            .within(
                config.request_timeout(),
                runs.create_run_stream(&thread_id, &request.options),
            )
            .await;
        let mut events = match opened {
            Ok(events) => events,
            Err(e) => {
                yield Err(e);
                return;
            }
        };
        lock(&shared).reset();
        tracing::debug!(thread_id = %thread_id, "run stream opened");

        loop {
            let idle = config.stream_idle_timeout();
            let update = match next_update(&mut events, &request.cancel, &deadline, idle).await {
                Ok(Some(Ok(update))) => update,
                Ok(Some(Err(e))) | Err(e) => {
                    yield Err(e);
                    return;
                }
                Ok(None) => {
                    yield Err(RunError::ProtocolViolation(
                        "stream ended before the run reached a terminal status".into(),
                    ));
                    return;
                }
            };

            match update {
                StreamUpdate::MessageDelta(delta) => {
                    let applied = lock(&shared).apply(&delta);
                    if let Err(e) = applied {
                        yield Err(e);
                        return;
                    }
                    yield Ok(StreamUpdate::MessageDelta(delta));
                }
                StreamUpdate::Error(error) => {
                    tracing::warn!(code = ?error.code, message = %error.message, "stream reported an error");
                    let message = error.message.clone();
                    yield Ok(StreamUpdate::Error(error));
                    yield Err(RunError::Stream(message));
                    return;
                }
                update => {
                    let Some(run) = update.run().cloned() else {
                        continue;
                    };
                    if let Err(e) = tracker.observe(&run) {
                        yield Err(e);
                        return;
                    }
                    let required_action = matches!(update, StreamUpdate::RequiredAction(_));
                    yield Ok(update);

                    if run.is_terminal() {
                        tracing::info!(run_id = %run.id, status = %run.status, elapsed_ms = deadline.elapsed().as_millis() as u64, "run settled");
                        if let Err(e) = terminal_outcome(run) {
                            yield Err(e);
                        }
                        return;
                    }
                    if !required_action {
                        continue;
                    }
                    if run.status != RunStatus::RequiresAction {
                        tracing::debug!(run_id = %run.id, status = %run.status, "required-action event without requires_action status");
                        continue;
                    }

                    let calls = match tracker.pending_calls(&run) {
                        Ok(Some(calls)) => calls,
                        Ok(None) => {
                            yield Err(RunError::ProtocolViolation(format!(
                                "run {} repeated a required action that was already answered",
                                run.id
                            )));
                            return;
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    // The current stream is finished once a required action arrives.
                    events = futures::stream::empty().boxed();

                    let resolved =
                        resolve_within(calls, resolver.as_ref(), &deadline, &request.cancel).await;
                    let outputs = match resolved {
                        Ok(outputs) => outputs,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    tracing::debug!(run_id = %run.id, outputs = outputs.len(), "submitting tool outputs");
                    let reopened = deadline
                        .within(
                            config.request_timeout(),
                            runs.submit_tool_outputs_stream(&thread_id, &run.id, &outputs),
                        )
                        .await;
                    events = match reopened {
                        Ok(events) => events,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };
                    tracker.record_submission(&outputs);
                    lock(&shared).reset();
                }
            }
        }
    };

    RunStream {
        inner: inner.boxed(),
        aggregator,
    }
}

/// Next item of `events`, or `Aborted`/`Timeout` if waiting for it is cut short.
async fn next_update(
    events: &mut UpdateStream,
    cancel: &CancellationToken,
    deadline: &Deadline,
    idle: Option<Duration>,
) -> Result<Option<Result<StreamUpdate, RunError>>, RunError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunError::Aborted),
        next = deadline.within(idle, async { Ok(events.next().await) }) => next,
    }
}
