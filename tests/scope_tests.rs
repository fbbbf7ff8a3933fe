//! Tests for scoped cleanup of threads and agents.

mod common;

use pretty_assertions::assert_eq;

use agentrun::error::RunError;
use agentrun::orchestrator::{with_cleanup, CleanupTargets};

use common::RecordingAdmin;

fn targets() -> CleanupTargets {
    CleanupTargets::new().thread("thread_1").agent("asst_1")
}

#[tokio::test]
async fn deletes_thread_then_agent_after_success() {
    let admin = RecordingAdmin::default();

    let value = with_cleanup(&admin, targets(), || async { Ok::<_, RunError>(42) })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(admin.deleted(), ["thread:thread_1", "agent:asst_1"]);
}

#[tokio::test]
async fn body_error_wins_over_cleanup_error() {
    let admin = RecordingAdmin::failing(true, false);

    let err = with_cleanup(&admin, targets(), || async {
        Err::<(), _>(RunError::Aborted)
    })
    .await
    .unwrap_err();

    assert!(matches!(err, RunError::Aborted));
    assert_eq!(admin.deleted(), ["thread:thread_1", "agent:asst_1"]);
}

#[tokio::test]
async fn cleanup_error_surfaces_after_success() {
    let admin = RecordingAdmin::failing(false, true);

    let err = with_cleanup(&admin, targets(), || async { Ok::<_, RunError>(()) })
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Api { status: 500, .. }));
}

#[tokio::test]
async fn empty_targets_delete_nothing() {
    let admin = RecordingAdmin::default();

    with_cleanup(&admin, CleanupTargets::new(), || async { Ok::<_, RunError>(()) })
        .await
        .unwrap();

    assert!(admin.deleted().is_empty());
}
