//! Tests for utility functions

use prometheus_handoff_queue::util::{now_ms, MessageId, Priority};

#[test]
fn test_priority_ordering() {
    assert!(Priority::Critical < Priority::High);
    assert!(Priority::High < Priority::Normal);
    assert!(Priority::Normal < Priority::Low);
}

#[test]
fn test_priority_default_is_normal() {
    assert_eq!(Priority::default(), Priority::Normal);
}

#[test]
fn test_priority_serde_names() {
    let json = serde_json::to_string(&Priority::Critical).unwrap();
    assert_eq!(json, "\"critical\"");
    let back: Priority = serde_json::from_str("\"low\"").unwrap();
    assert_eq!(back, Priority::Low);
    assert_eq!(Priority::High.to_string(), "high");
}

#[test]
fn test_message_id_serializes_as_uuid() {
    let id = MessageId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.as_uuid()));
}

#[test]
fn test_clock_advances() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    prometheus_handoff_queue::util::init_tracing();
    prometheus_handoff_queue::util::init_tracing();
    tracing::info!("tracing initialised twice without panicking");
}
