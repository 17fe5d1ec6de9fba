//! Queue configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default message time-to-live: five minutes.
pub const DEFAULT_MESSAGE_TTL_MS: u64 = 5 * 60 * 1000;
/// Default interval between background TTL sweeps.
pub const DEFAULT_REAPER_INTERVAL_MS: u64 = 30 * 1000;

/// Environment variable prefix read by [`QueueConfig::from_env`].
pub const ENV_PREFIX: &str = "HANDOFF_QUEUE_";

/// Queue configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum buffered messages; 0 means unbounded. Handoffs never count.
    pub max_size: usize,
    /// Maximum buffered lifetime in milliseconds; 0 disables expiry.
    pub message_ttl_ms: u64,
    /// Interval between background TTL sweeps in milliseconds.
    pub reaper_interval_ms: u64,
    /// Order the buffer by priority; when false the buffer is plain FIFO.
    pub priority_queuing: bool,
    /// Run the background TTL reaper.
    pub auto_cleanup: bool,
    /// Collect statistics.
    pub enable_stats: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: 0,
            message_ttl_ms: DEFAULT_MESSAGE_TTL_MS,
            reaper_interval_ms: DEFAULT_REAPER_INTERVAL_MS,
            priority_queuing: true,
            auto_cleanup: true,
            enable_stats: true,
        }
    }
}

impl QueueConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the buffer.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the message TTL; `Duration::ZERO` disables expiry.
    #[must_use]
    pub fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the background sweep interval.
    #[must_use]
    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Toggle priority ordering.
    #[must_use]
    pub const fn with_priority_queuing(mut self, enabled: bool) -> Self {
        self.priority_queuing = enabled;
        self
    }

    /// Toggle the background reaper.
    #[must_use]
    pub const fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    /// Toggle statistics.
    #[must_use]
    pub const fn with_stats(mut self, enabled: bool) -> Self {
        self.enable_stats = enabled;
        self
    }

    /// Bound as an option; `None` when unbounded.
    pub const fn capacity(&self) -> Option<usize> {
        if self.max_size == 0 {
            None
        } else {
            Some(self.max_size)
        }
    }

    /// TTL as an option; `None` when expiry is disabled.
    pub const fn message_ttl(&self) -> Option<Duration> {
        if self.message_ttl_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.message_ttl_ms))
        }
    }

    /// Whether a background reaper should run for this configuration.
    pub const fn wants_reaper(&self) -> bool {
        self.auto_cleanup && self.message_ttl_ms > 0
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.wants_reaper() && self.reaper_interval_ms == 0 {
            return Err("reaper_interval_ms must be greater than 0 when auto_cleanup is on".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate. Missing fields take defaults.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `.env` if present, then read `HANDOFF_QUEUE_*` variables over the
    /// defaults and validate.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; keys carry the [`ENV_PREFIX`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let read = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = read("MAX_SIZE") {
            cfg.max_size = parse_value("MAX_SIZE", &v)?;
        }
        if let Some(v) = read("MESSAGE_TTL_MS") {
            cfg.message_ttl_ms = parse_value("MESSAGE_TTL_MS", &v)?;
        }
        if let Some(v) = read("REAPER_INTERVAL_MS") {
            cfg.reaper_interval_ms = parse_value("REAPER_INTERVAL_MS", &v)?;
        }
        if let Some(v) = read("PRIORITY_QUEUING") {
            cfg.priority_queuing = parse_value("PRIORITY_QUEUING", &v)?;
        }
        if let Some(v) = read("AUTO_CLEANUP") {
            cfg.auto_cleanup = parse_value("AUTO_CLEANUP", &v)?;
        }
        if let Some(v) = read("ENABLE_STATS") {
            cfg.enable_stats = parse_value("ENABLE_STATS", &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{ENV_PREFIX}{name}: invalid value `{raw}`: {e}"))
}
