//! Integration tests for the single-consumer protocol: exclusivity,
//! cancellation, restart and the `Stream` adapter.

use std::pin::pin;
use std::time::Duration;

use futures::{poll, StreamExt};
use prometheus_handoff_queue::config::QueueConfig;
use prometheus_handoff_queue::core::{Message, MessageKind, MessageQueue, QueueError};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn queue() -> MessageQueue {
    MessageQueue::new(QueueConfig::new().with_auto_cleanup(false)).unwrap()
}

fn text(message: &Message) -> &str {
    match message.kind() {
        MessageKind::UserInput { text } => text,
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[tokio::test]
async fn test_second_pull_fails_fast() {
    let queue = queue();
    let mut first = pin!(queue.pull());
    assert!(poll!(first.as_mut()).is_pending());

    let second = timeout(Duration::from_millis(200), queue.pull()).await.unwrap();
    assert!(matches!(second, Err(QueueError::AlreadyConsuming)));
    assert!(matches!(queue.consumer(), Err(QueueError::AlreadyConsuming)));

    // The rejected attempt did not disturb the outstanding pull.
    queue.enqueue(Message::user_input("for first")).unwrap();
    let got = first.await.unwrap().unwrap();
    assert_eq!(text(&got), "for first");
}

#[tokio::test]
async fn test_consumer_handle_is_exclusive_and_restartable() {
    let queue = queue();
    queue.enqueue(Message::user_input("a")).unwrap();
    queue.enqueue(Message::user_input("b")).unwrap();

    let mut consumer = queue.consumer().unwrap();
    assert!(matches!(queue.pull().await, Err(QueueError::AlreadyConsuming)));
    assert_eq!(text(&consumer.next().await.unwrap().unwrap()), "a");
    drop(consumer);

    let mut consumer = queue.consumer().unwrap();
    assert_eq!(text(&consumer.next().await.unwrap().unwrap()), "b");
}

#[tokio::test]
async fn test_cancel_unblocks_and_clears_waiter() {
    let queue = queue();
    let token = CancellationToken::new();

    let mut pull = pin!(queue.pull_with_cancel(&token));
    assert!(poll!(pull.as_mut()).is_pending());

    token.cancel();
    let result = timeout(Duration::from_secs(1), pull).await.unwrap();
    assert!(matches!(result, Err(QueueError::Cancelled)));

    // No waiter remains: the next enqueue is buffered, not lost.
    queue.enqueue(Message::user_input("after cancel")).unwrap();
    assert_eq!(queue.size().unwrap(), 1);
    let got = queue.pull().await.unwrap().unwrap();
    assert_eq!(text(&got), "after cancel");
}

#[tokio::test]
async fn test_cancel_does_not_affect_enqueue() {
    let queue = queue();
    let token = CancellationToken::new();
    token.cancel();

    queue.enqueue(Message::user_input("ready")).unwrap();
    // A buffered message resolves without suspending, even with a fired token.
    let got = queue.pull_with_cancel(&token).await.unwrap().unwrap();
    assert_eq!(text(&got), "ready");

    let result = queue.pull_with_cancel(&token).await;
    assert!(matches!(result, Err(QueueError::Cancelled)));
}

#[tokio::test]
async fn test_dropped_pull_requeues_raced_handoff() {
    let queue = queue();
    let sent = Message::user_input("raced");
    let id = sent.id();

    {
        let mut pull = pin!(queue.pull());
        assert!(poll!(pull.as_mut()).is_pending());
        queue.enqueue(sent).unwrap();
        // Dropped before observing the handed-off message.
    }

    assert_eq!(queue.size().unwrap(), 1);
    let got = queue.pull().await.unwrap().unwrap();
    assert_eq!(got.id(), id);
}

#[tokio::test]
async fn test_consumer_with_cancel_stops_sequence() {
    let queue = queue();
    let token = CancellationToken::new();
    let mut consumer = queue.consumer_with_cancel(token.clone()).unwrap();

    queue.enqueue(Message::user_input("one")).unwrap();
    assert!(consumer.next().await.unwrap().is_some());

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });
    let result = timeout(Duration::from_secs(1), consumer.next()).await.unwrap();
    assert!(matches!(result, Err(QueueError::Cancelled)));
}

#[tokio::test]
async fn test_stream_yields_until_done() {
    let queue = queue();
    let producer = queue.clone();
    tokio::spawn(async move {
        for i in 0..3 {
            producer.enqueue(Message::user_input(format!("s{i}"))).unwrap();
            tokio::task::yield_now().await;
        }
        producer.done().unwrap();
    });

    let items: Vec<_> = timeout(Duration::from_secs(2), queue.stream().unwrap().collect::<Vec<_>>())
        .await
        .unwrap();
    let texts: Vec<_> = items
        .into_iter()
        .map(|item| text(&item.unwrap()).to_string())
        .collect();
    assert_eq!(texts, vec!["s0", "s1", "s2"]);

    // The stream released the consumer slot when it ended.
    assert!(queue.consumer().is_ok());
}

#[tokio::test]
async fn test_stream_ends_after_error() {
    let queue = queue();
    let mut stream = queue.stream().unwrap();
    queue.fail(anyhow::anyhow!("agent crashed")).unwrap();

    let first = timeout(Duration::from_secs(1), stream.next()).await.unwrap();
    assert!(matches!(first, Some(Err(QueueError::QueueErrored(_)))));
    assert!(stream.next().await.is_none());
}
