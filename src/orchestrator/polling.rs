//! Pull-based driving: create, then poll until the run settles.

use tokio_util::sync::CancellationToken;

use super::tool_phase::resolve_within;
use super::tracker::RunTracker;
use super::RunRequest;
use crate::config::OrchestratorConfig;
use crate::error::RunError;
use crate::service::RunService;
use crate::tools::ToolOutputResolver;
use crate::types::{Run, RunStatus};
use crate::util::timeout::Deadline;

/// Drive a run to a terminal snapshot by polling.
///
/// Returns the terminal snapshot whatever its status; mapping it to an
/// outcome is left to the caller.
pub(crate) async fn poll_until_terminal(
    runs: &dyn RunService,
    config: &OrchestratorConfig,
    request: &RunRequest,
    resolver: &dyn ToolOutputResolver,
) -> Result<Run, RunError> {
    let deadline = Deadline::new(config.max_wait());
    let thread_id = request.thread_id.as_str();
    let mut tracker = RunTracker::new();

    let mut run = deadline
        .within(
            config.request_timeout(),
            runs.create_run(thread_id, &request.options),
        )
        .await?;
    tracker.observe(&run)?;
    let run_id = run.id.clone();
    tracing::info!(%run_id, thread_id, status = %run.status, "run created");

    loop {
        if run.is_terminal() {
            tracing::info!(%run_id, status = %run.status, elapsed_ms = deadline.elapsed().as_millis() as u64, "run settled");
            return Ok(run);
        }
        ensure_active(&request.cancel)?;

        if run.status == RunStatus::RequiresAction {
            match tracker.pending_calls(&run)? {
                Some(calls) => {
                    tracing::debug!(%run_id, tool_calls = calls.len(), "run requires action");
                    let outputs =
                        resolve_within(calls, resolver, &deadline, &request.cancel).await?;
                    tracing::debug!(%run_id, outputs = outputs.len(), "submitting tool outputs");
                    run = deadline
                        .within(
                            config.request_timeout(),
                            runs.submit_tool_outputs(thread_id, &run_id, &outputs),
                        )
                        .await?;
                    tracker.record_submission(&outputs);
                    tracker.observe(&run)?;
                    continue;
                }
                None => {
                    tracing::warn!(%run_id, "stale required action; calls already answered");
                }
            }
        }

        deadline.check()?;
        tokio::select! {
            biased;
            _ = request.cancel.cancelled() => return Err(RunError::Aborted),
            _ = tokio::time::sleep(config.poll_interval()) => {}
        }
        deadline.check()?;

        run = deadline
            .within(config.request_timeout(), runs.get_run(thread_id, &run_id))
            .await?;
        tracing::debug!(%run_id, status = %run.status, "polled run");
        tracker.observe(&run)?;
    }
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<(), RunError> {
    if cancel.is_cancelled() {
        Err(RunError::Aborted)
    } else {
        Ok(())
    }
}
