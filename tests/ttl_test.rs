//! Integration tests for TTL expiry, lazy and via the background reaper.

use std::time::Duration;

use prometheus_handoff_queue::config::QueueConfig;
use prometheus_handoff_queue::core::{Message, MessageKind, MessageQueue, QueueError};
use prometheus_handoff_queue::util::now_ms;

fn stale(text: &str, age_ms: u128) -> Message {
    Message::user_input(text).with_created_at_ms(now_ms() - age_ms)
}

fn lazy_queue(ttl: Duration) -> MessageQueue {
    MessageQueue::new(
        QueueConfig::new()
            .with_message_ttl(ttl)
            .with_auto_cleanup(false),
    )
    .unwrap()
}

#[tokio::test]
async fn test_expired_message_never_pulled() {
    let queue = lazy_queue(Duration::from_millis(100));
    queue.enqueue(stale("old", 10_000)).unwrap();
    queue.enqueue(Message::user_input("fresh")).unwrap();
    queue.done().unwrap();

    let got = queue.pull().await.unwrap().unwrap();
    assert!(matches!(got.kind(), MessageKind::UserInput { text } if text == "fresh"));
    assert!(queue.pull().await.unwrap().is_none());
    assert_eq!(queue.stats().unwrap().expired, 1);
}

#[tokio::test]
async fn test_message_expires_while_buffered() {
    let queue = lazy_queue(Duration::from_millis(30));
    queue.enqueue(Message::user_input("short lived")).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(queue.peek().unwrap().is_none());
    queue.done().unwrap();
    assert!(queue.pull().await.unwrap().is_none());
}

#[tokio::test]
async fn test_size_queries_agree_with_peek() {
    let queue = lazy_queue(Duration::from_millis(100));
    queue.enqueue(stale("old", 5_000)).unwrap();

    assert!(queue.is_empty().unwrap());
    assert_eq!(queue.size().unwrap(), 0);
    assert_eq!(queue.state().message_count, 0);
    assert!(queue.peek().unwrap().is_none());
    assert_eq!(queue.stats().unwrap().expired, 1);
}

#[tokio::test]
async fn test_zero_ttl_never_expires() {
    let queue = lazy_queue(Duration::ZERO);
    queue.enqueue(stale("ancient", 86_400_000)).unwrap();
    assert!(queue.peek().unwrap().is_some());
    assert_eq!(queue.reap_expired().unwrap(), 0);
}

#[tokio::test]
async fn test_manual_reap() {
    let queue = lazy_queue(Duration::from_millis(100));
    queue.enqueue(Message::user_input("c")).unwrap();
    queue.enqueue(stale("a", 5_000)).unwrap();
    queue.enqueue(stale("b", 5_000)).unwrap();

    // Expired entries behind a live front are counted until swept.
    assert_eq!(queue.size().unwrap(), 3);
    assert_eq!(queue.reap_expired().unwrap(), 2);
    assert_eq!(queue.size().unwrap(), 1);
}

#[tokio::test]
async fn test_capacity_reclaims_expired_slots() {
    let queue = MessageQueue::new(
        QueueConfig::new()
            .with_max_size(1)
            .with_message_ttl(Duration::from_millis(100))
            .with_auto_cleanup(false),
    )
    .unwrap();
    queue.enqueue(stale("expired", 5_000)).unwrap();
    assert!(!queue.is_full().unwrap());

    queue.enqueue(Message::user_input("fits")).unwrap();
    assert!(queue.is_full().unwrap());
    assert!(matches!(
        queue.enqueue(Message::user_input("overflow")),
        Err(QueueError::QueueFull { .. })
    ));
}

#[tokio::test]
async fn test_reaper_sweeps_in_background() {
    let queue = MessageQueue::new(
        QueueConfig::new()
            .with_message_ttl(Duration::from_millis(30))
            .with_reaper_interval(Duration::from_millis(20)),
    )
    .unwrap();
    for i in 0..3 {
        queue.enqueue(Message::user_input(format!("m{i}"))).unwrap();
    }

    tokio::time::sleep(Duration::from_millis(250)).await;

    // Nothing read the buffer in the meantime, so only the reaper expired them.
    assert_eq!(queue.stats().unwrap().expired, 3);
    assert_eq!(queue.size().unwrap(), 0);
}
