//! Timeout helpers.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::RunError;

/// Wrap a future with an optional timeout.
pub async fn with_timeout<T>(
    duration: Option<Duration>,
    future: impl Future<Output = Result<T, RunError>>,
) -> Result<T, RunError> {
    let Some(duration) = duration else {
        return future.await;
    };
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(RunError::Timeout(duration.as_millis() as u64)),
    }
}

/// A cumulative wait budget measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail with `Timeout` once the budget is spent.
    pub fn check(&self) -> Result<(), RunError> {
        match self.limit {
            Some(limit) if self.elapsed() >= limit => {
                Err(RunError::Timeout(limit.as_millis() as u64))
            }
            _ => Ok(()),
        }
    }

    /// Run `future` under the tighter of `per_operation` and what is left of
    /// the budget.
    ///
    /// On expiry the error carries the configured limit that tripped, never
    /// the leftover slice of the budget.
    pub async fn within<T>(
        &self,
        per_operation: Option<Duration>,
        future: impl Future<Output = Result<T, RunError>>,
    ) -> Result<T, RunError> {
        let Some((wait, limit)) = self.wait_for(per_operation) else {
            return future.await;
        };
        match tokio::time::timeout(wait, future).await {
            Ok(result) => result,
            Err(_) => Err(RunError::Timeout(limit.as_millis() as u64)),
        }
    }

    /// How long to wait and which configured limit that wait enforces.
    fn wait_for(&self, per_operation: Option<Duration>) -> Option<(Duration, Duration)> {
        let remaining = self
            .limit
            .map(|limit| (limit.saturating_sub(self.elapsed()), limit));
        match (per_operation, remaining) {
            (Some(op), Some((left, limit))) if left < op => Some((left, limit)),
            (Some(op), _) => Some((op, op)),
            (None, remaining) => remaining,
        }
    }
}
