//! Tests for configuration validation

use std::time::Duration;

use prometheus_handoff_queue::config::{QueueConfig, DEFAULT_MESSAGE_TTL_MS};

#[test]
fn test_default_config_is_valid() {
    let cfg = QueueConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.max_size, 0);
    assert_eq!(cfg.message_ttl_ms, DEFAULT_MESSAGE_TTL_MS);
    assert!(cfg.wants_reaper());
}

#[test]
fn test_builder_setters() {
    let cfg = QueueConfig::new()
        .with_max_size(16)
        .with_message_ttl(Duration::from_secs(2))
        .with_reaper_interval(Duration::from_millis(250))
        .with_priority_queuing(false)
        .with_stats(false);
    assert_eq!(cfg.capacity(), Some(16));
    assert_eq!(cfg.message_ttl(), Some(Duration::from_secs(2)));
    assert_eq!(cfg.reaper_interval_ms, 250);
    assert!(!cfg.priority_queuing);
    assert!(!cfg.enable_stats);
}

#[test]
fn test_zero_ttl_disables_expiry_and_reaper() {
    let cfg = QueueConfig::new().with_message_ttl(Duration::ZERO);
    assert_eq!(cfg.message_ttl(), None);
    assert!(!cfg.wants_reaper());
}

#[test]
fn test_invalid_reaper_interval() {
    let cfg = QueueConfig::new().with_reaper_interval(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_partial() {
    let cfg = QueueConfig::from_json_str(r#"{"max_size": 3, "enable_stats": false}"#).unwrap();
    assert_eq!(cfg.capacity(), Some(3));
    assert!(!cfg.enable_stats);
    assert!(cfg.priority_queuing);
    assert_eq!(cfg.message_ttl_ms, DEFAULT_MESSAGE_TTL_MS);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(QueueConfig::from_json_str("{not json").is_err());
    assert!(QueueConfig::from_json_str(r#"{"reaper_interval_ms": 0}"#).is_err());
}

#[test]
fn test_config_serializes() {
    let cfg = QueueConfig::new().with_max_size(7);
    let json = serde_json::to_string(&cfg).unwrap();
    let back = QueueConfig::from_json_str(&json).unwrap();
    assert_eq!(back, cfg);
}
