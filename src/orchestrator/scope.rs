//! Scoped teardown of the threads and agents a body of work created.

use std::future::Future;

use crate::error::RunError;
use crate::service::AgentAdministration;

/// Resources to delete once a scoped body finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupTargets {
    pub thread_id: Option<String>,
    pub agent_id: Option<String>,
}

impl CleanupTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Run `body`, then delete `targets` whether it succeeded or not.
///
/// The thread is deleted before the agent and both deletions are always
/// attempted. A body error is returned as is, with cleanup failures only
/// logged; if the body succeeded, the first cleanup failure is returned.
/// Cleanup does not run when the returned future is dropped before it
/// completes.
pub async fn with_cleanup<T, F, Fut>(
    admin: &dyn AgentAdministration,
    targets: CleanupTargets,
    body: F,
) -> Result<T, RunError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, RunError>>,
{
    let result = body().await;
    let cleanup = release(admin, &targets).await;

    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), cleanup) => {
            if let Err(cleanup_error) = cleanup {
                tracing::warn!(error = %cleanup_error, "cleanup failed after an earlier error");
            }
            Err(e)
        }
    }
}

async fn release(admin: &dyn AgentAdministration, targets: &CleanupTargets) -> Result<(), RunError> {
    let mut first_error = None;

    if let Some(thread_id) = &targets.thread_id {
        match admin.delete_thread(thread_id).await {
            Ok(()) => tracing::debug!(thread_id = %thread_id, "thread deleted"),
            Err(e) => {
                tracing::warn!(thread_id = %thread_id, error = %e, "failed to delete thread");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(agent_id) = &targets.agent_id {
        match admin.delete_agent(agent_id).await {
            Ok(()) => tracing::debug!(agent_id = %agent_id, "agent deleted"),
            Err(e) => {
                tracing::warn!(agent_id = %agent_id, error = %e, "failed to delete agent");
                first_error.get_or_insert(e);
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}
