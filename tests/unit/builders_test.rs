//! Tests for builder modules

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use prometheus_handoff_queue::builders::MessageQueueBuilder;
use prometheus_handoff_queue::config::QueueConfig;
use prometheus_handoff_queue::core::QueueError;

#[test]
fn test_builder_rejects_invalid_config() {
    let config = QueueConfig {
        reaper_interval_ms: 0,
        ..QueueConfig::default()
    };
    let err = MessageQueueBuilder::new(config).build().unwrap_err();
    assert!(matches!(err, QueueError::InvalidConfig(_)));
}

#[test]
fn test_builder_outside_runtime_skips_reaper() {
    // No tokio runtime here: construction still succeeds, expiry stays lazy.
    let queue = MessageQueueBuilder::new(QueueConfig::default()).build().unwrap();
    assert_eq!(queue.size().unwrap(), 0);
    assert_eq!(queue.config().max_size, 0);
}

#[tokio::test]
async fn test_builder_cleanup_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let queue = MessageQueueBuilder::new(QueueConfig::new().with_auto_cleanup(false))
        .with_cleanup_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build()
        .unwrap();

    queue.destroy().await.unwrap();
    queue.destroy().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
