//! Tests for error types

use prometheus_handoff_queue::core::QueueError;

#[test]
fn test_queue_full_error() {
    let err = QueueError::QueueFull {
        size: 4,
        max_size: 4,
    };
    assert_eq!(format!("{}", err), "queue full: 4/4 messages buffered");
}

#[test]
fn test_already_consuming_error() {
    let err = QueueError::AlreadyConsuming;
    assert_eq!(
        format!("{}", err),
        "already consuming: another consumer is attached"
    );
}

#[test]
fn test_queue_done_error() {
    let err = QueueError::QueueDone;
    assert_eq!(
        format!("{}", err),
        "queue done: no further messages are accepted"
    );
}

#[test]
fn test_queue_errored_carries_cause() {
    let err = QueueError::errored(anyhow::anyhow!("model crashed"));
    assert_eq!(format!("{}", err), "queue errored: model crashed");
}

#[test]
fn test_cleanup_failed_error() {
    let err = QueueError::CleanupFailed("socket already closed".to_string());
    assert_eq!(format!("{}", err), "cleanup failed: socket already closed");
}

#[test]
fn test_errored_clones_share_cause() {
    let err = QueueError::errored(anyhow::anyhow!("boom"));
    let copy = err.clone();
    match (err, copy) {
        (QueueError::QueueErrored(a), QueueError::QueueErrored(b)) => {
            assert!(std::sync::Arc::ptr_eq(&a, &b));
        }
        other => panic!("unexpected variants: {other:?}"),
    }
}

#[test]
fn test_terminal_variants() {
    assert!(QueueError::QueueDestroyed.is_terminal());
    assert!(QueueError::errored(anyhow::anyhow!("x")).is_terminal());
    assert!(!QueueError::QueueDone.is_terminal());
    assert!(!QueueError::Cancelled.is_terminal());
    assert!(!QueueError::AlreadyConsuming.is_terminal());
}
