//! Resolution of a required-action batch into submittable outputs.

use tokio_util::sync::CancellationToken;

use super::polling::ensure_active;
use crate::error::RunError;
use crate::tools::ToolOutputResolver;
use crate::types::{RequiredToolCall, ToolOutput};
use crate::util::timeout::Deadline;

/// Resolve a batch within what is left of the run's wait budget.
///
/// Cancellation interrupts a resolver still working. Outputs are only
/// returned while the request is active and the budget is not spent, so
/// the caller may submit them right away.
pub(crate) async fn resolve_within(
    calls: &[RequiredToolCall],
    resolver: &dyn ToolOutputResolver,
    deadline: &Deadline,
    cancel: &CancellationToken,
) -> Result<Vec<ToolOutput>, RunError> {
    ensure_active(cancel)?;
    let outputs = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RunError::Aborted),
        resolved = deadline.within(None, resolve_tool_outputs(calls, resolver)) => resolved?,
    };
    ensure_active(cancel)?;
    deadline.check()?;
    Ok(outputs)
}

/// Resolve every call of a batch, in call order.
///
/// The batch is all-or-nothing: the first failure aborts it, so a partial
/// set of outputs is never returned.
pub(crate) async fn resolve_tool_outputs(
    calls: &[RequiredToolCall],
    resolver: &dyn ToolOutputResolver,
) -> Result<Vec<ToolOutput>, RunError> {
    let mut outputs = Vec::with_capacity(calls.len());

    for call in calls {
        tracing::debug!(call_id = call.id(), kind = call.kind(), "resolving tool call");
        let output = resolver
            .resolve(call)
            .await
            .map_err(|e| RunError::unresolved(call.id(), e))?;

        if output.tool_call_id != call.id() {
            return Err(RunError::unresolved(
                call.id(),
                RunError::ProtocolViolation(format!(
                    "resolver answered with an output for call {}",
                    output.tool_call_id
                )),
            ));
        }
        outputs.push(output);
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::tools::resolver_fn;

    #[tokio::test]
    async fn outputs_follow_call_order() {
        let calls = vec![
            RequiredToolCall::function("call_b", "f", "{}"),
            RequiredToolCall::function("call_a", "f", "{}"),
        ];
        let resolver = resolver_fn(|call: &RequiredToolCall| {
            Ok(ToolOutput::new(call.id(), format!("out-{}", call.id())))
        });

        let outputs = resolve_tool_outputs(&calls, &resolver).await.unwrap();
        let ids: Vec<_> = outputs.iter().map(|o| o.tool_call_id.as_str()).collect();
        assert_eq!(ids, ["call_b", "call_a"]);
    }

    #[tokio::test]
    async fn mismatched_output_id_is_unresolved() {
        let calls = vec![RequiredToolCall::function("call_1", "f", "{}")];
        let resolver = resolver_fn(|_: &RequiredToolCall| Ok(ToolOutput::new("call_9", "x")));

        let err = resolve_tool_outputs(&calls, &resolver).await.unwrap_err();
        assert!(matches!(err, RunError::UnresolvedToolCall { call_id, .. } if call_id == "call_1"));
    }

    #[tokio::test]
    async fn first_failure_aborts_the_batch() {
        let calls = vec![
            RequiredToolCall::function("call_1", "f", "{}"),
            RequiredToolCall::function("call_2", "g", "{}"),
        ];
        let resolver = resolver_fn(|call: &RequiredToolCall| {
            if call.id() == "call_2" {
                Err(RunError::UnknownTool("g".into()))
            } else {
                Ok(ToolOutput::new(call.id(), "ok"))
            }
        });

        let err = resolve_tool_outputs(&calls, &resolver).await.unwrap_err();
        assert!(matches!(err, RunError::UnresolvedToolCall { call_id, .. } if call_id == "call_2"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_a_running_resolver() {
        struct Stuck;

        #[async_trait::async_trait]
        impl ToolOutputResolver for Stuck {
            async fn resolve(&self, _call: &RequiredToolCall) -> Result<ToolOutput, RunError> {
                std::future::pending().await
            }
        }

        let calls = vec![RequiredToolCall::function("call_1", "f", "{}")];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = resolve_within(&calls, &Stuck, &Deadline::new(None), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Aborted));
    }

    #[tokio::test(start_paused = true)]
    async fn spent_budget_withholds_outputs() {
        let calls = vec![RequiredToolCall::function("call_1", "f", "{}")];
        let resolver = resolver_fn(|call: &RequiredToolCall| Ok(ToolOutput::new(call.id(), "ok")));
        let deadline = Deadline::new(Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_secs(1)).await;

        let err = resolve_within(&calls, &resolver, &deadline, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout(1000)));
    }
}
