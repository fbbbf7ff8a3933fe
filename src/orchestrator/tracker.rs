//! Validation of the run status path observed by the orchestrator.

use std::collections::HashSet;

use crate::error::RunError;
use crate::types::{RequiredToolCall, Run, RunStatus, ToolOutput};

/// Tracks one run's observed snapshots and rejects paths outside the
/// lifecycle state machine.
#[derive(Debug, Default)]
pub(crate) struct RunTracker {
    run_id: Option<String>,
    status: Option<RunStatus>,
    submitted: HashSet<String>,
}

impl RunTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Validate and record a snapshot.
    pub(crate) fn observe(&mut self, run: &Run) -> Result<(), RunError> {
        match &self.run_id {
            Some(id) if id != &run.id => {
                return Err(RunError::ProtocolViolation(format!(
                    "expected a snapshot of run {id}, received run {}",
                    run.id
                )));
            }
            Some(_) => {}
            None => self.run_id = Some(run.id.clone()),
        }

        if let Some(previous) = self.status {
            if !previous.can_transition_to(run.status) {
                return Err(RunError::ProtocolViolation(format!(
                    "run {} moved from {previous} to {}",
                    run.id, run.status
                )));
            }
            if previous != run.status {
                tracing::debug!(run_id = %run.id, from = %previous, to = %run.status, "run status changed");
            }
        }

        if run.status == RunStatus::RequiresAction {
            validate_required_action(run)?;
        }

        self.status = Some(run.status);
        Ok(())
    }

    /// Calls of a `requires_action` snapshot that still need outputs.
    ///
    /// `None` means every call was already answered and the snapshot is
    /// stale; answering it again would duplicate a submission.
    pub(crate) fn pending_calls<'a>(
        &self,
        run: &'a Run,
    ) -> Result<Option<&'a [RequiredToolCall]>, RunError> {
        let calls = run.required_tool_calls().unwrap_or_default();
        let answered = calls
            .iter()
            .filter(|call| self.submitted.contains(call.id()))
            .count();

        match answered {
            0 => Ok(Some(calls)),
            n if n == calls.len() => Ok(None),
            _ => Err(RunError::ProtocolViolation(format!(
                "run {} requires outputs for a mix of answered and new tool calls",
                run.id
            ))),
        }
    }

    pub(crate) fn record_submission(&mut self, outputs: &[ToolOutput]) {
        self.submitted
            .extend(outputs.iter().map(|o| o.tool_call_id.clone()));
    }
}

fn validate_required_action(run: &Run) -> Result<(), RunError> {
    let calls = run.required_tool_calls().ok_or_else(|| {
        RunError::ProtocolViolation(format!(
            "run {} requires action but carries no required action",
            run.id
        ))
    })?;
    if calls.is_empty() {
        return Err(RunError::ProtocolViolation(format!(
            "run {} requires action with an empty tool-call list",
            run.id
        )));
    }

    let mut seen = HashSet::with_capacity(calls.len());
    for call in calls {
        if !seen.insert(call.id()) {
            return Err(RunError::ProtocolViolation(format!(
                "run {} lists tool call {} twice",
                run.id,
                call.id()
            )));
        }
    }
    Ok(())
}

/// Map a terminal snapshot to the caller-facing outcome.
pub(crate) fn terminal_outcome(run: Run) -> Result<Run, RunError> {
    match run.status {
        RunStatus::Completed => Ok(run),
        RunStatus::Failed => Err(RunError::RunFailed(Box::new(run))),
        RunStatus::Cancelled => Err(RunError::RunCancelled(Box::new(run))),
        RunStatus::Expired => Err(RunError::RunExpired(Box::new(run))),
        status => Err(RunError::ProtocolViolation(format!(
            "run {} is not terminal ({status})",
            run.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: RunStatus) -> Run {
        Run::new("run_1", "thread_1", "asst_1", status)
    }

    fn action(ids: &[&str]) -> Run {
        run(RunStatus::InProgress).with_required_calls(
            ids.iter()
                .map(|id| RequiredToolCall::function(*id, "f", "{}"))
                .collect(),
        )
    }

    #[test]
    fn accepts_the_lifecycle_path() {
        let mut tracker = RunTracker::new();
        tracker.observe(&run(RunStatus::Queued)).unwrap();
        tracker.observe(&run(RunStatus::InProgress)).unwrap();
        tracker.observe(&action(&["call_1"])).unwrap();
        tracker.observe(&run(RunStatus::Queued)).unwrap();
        tracker.observe(&run(RunStatus::InProgress)).unwrap();
        tracker.observe(&run(RunStatus::Completed)).unwrap();
        tracker.observe(&run(RunStatus::Completed)).unwrap();
    }

    #[test]
    fn rejects_leaving_a_terminal_status() {
        let mut tracker = RunTracker::new();
        tracker.observe(&run(RunStatus::Failed)).unwrap();
        assert!(matches!(
            tracker.observe(&run(RunStatus::InProgress)),
            Err(RunError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn rejects_regression_to_queued() {
        let mut tracker = RunTracker::new();
        tracker.observe(&run(RunStatus::InProgress)).unwrap();
        assert!(tracker.observe(&run(RunStatus::Queued)).is_err());
    }

    #[test]
    fn rejects_snapshot_of_another_run() {
        let mut tracker = RunTracker::new();
        tracker.observe(&run(RunStatus::Queued)).unwrap();
        let other = Run::new("run_2", "thread_1", "asst_1", RunStatus::InProgress);
        assert!(tracker.observe(&other).is_err());
    }

    #[test]
    fn rejects_empty_or_missing_required_action() {
        let mut tracker = RunTracker::new();
        assert!(tracker.observe(&action(&[])).is_err());
        assert!(tracker.observe(&run(RunStatus::RequiresAction)).is_err());
        assert!(tracker.observe(&action(&["call_1", "call_1"])).is_err());
    }

    #[test]
    fn answered_calls_make_a_snapshot_stale() {
        let mut tracker = RunTracker::new();
        let snapshot = action(&["call_1", "call_2"]);
        assert_eq!(tracker.pending_calls(&snapshot).unwrap().unwrap().len(), 2);

        tracker.record_submission(&[
            ToolOutput::new("call_1", "a"),
            ToolOutput::new("call_2", "b"),
        ]);
        assert!(tracker.pending_calls(&snapshot).unwrap().is_none());

        let mixed = action(&["call_2", "call_3"]);
        assert!(tracker.pending_calls(&mixed).is_err());
    }

    #[test]
    fn terminal_outcomes_map_to_distinct_errors() {
        assert!(terminal_outcome(run(RunStatus::Completed)).is_ok());
        assert!(matches!(
            terminal_outcome(run(RunStatus::Failed)),
            Err(RunError::RunFailed(_))
        ));
        assert!(matches!(
            terminal_outcome(run(RunStatus::Cancelled)),
            Err(RunError::RunCancelled(_))
        ));
        assert!(matches!(
            terminal_outcome(run(RunStatus::Expired)),
            Err(RunError::RunExpired(_))
        ));
    }
}
