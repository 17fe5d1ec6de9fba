//! Observational counters. Nothing here can fail or block a queue operation.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::util::serde::Priority;

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    /// Messages accepted by enqueue (handoffs and buffered).
    pub total_accepted: u64,
    /// Messages delivered straight to a waiting consumer.
    pub handoffs: u64,
    /// Messages returned to the consumer.
    pub delivered: u64,
    /// Buffered messages discarded for exceeding the TTL.
    pub expired: u64,
    /// Enqueues rejected for capacity.
    pub rejected: u64,
    /// Messages removed by clear, fail or destroy.
    pub cleared: u64,
    /// Errors reported to producers plus failure signals.
    pub error_count: u64,
    /// Accepted messages per kind tag.
    pub by_kind: BTreeMap<String, u64>,
    /// Accepted messages per priority name.
    pub by_priority: BTreeMap<String, u64>,
    /// Mean time spent in the buffer by delivered messages, in milliseconds.
    pub average_wait_ms: f64,
    /// Current buffer length.
    pub buffer_len: usize,
}

/// Accumulates counters while the queue runs.
#[derive(Debug, Default)]
pub struct StatsCollector {
    accepted: u64,
    handoffs: u64,
    delivered: u64,
    rejected: u64,
    cleared: u64,
    errors: u64,
    by_kind: HashMap<&'static str, u64>,
    by_priority: HashMap<Priority, u64>,
    total_wait_ms: u128,
    waited: u64,
}

impl StatsCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an accepted message by kind tag and priority; `handoff` marks the
    /// zero-latency path.
    pub fn record_accepted(&mut self, kind: &'static str, priority: Priority, handoff: bool) {
        self.accepted += 1;
        if handoff {
            self.handoffs += 1;
        }
        *self.by_kind.entry(kind).or_default() += 1;
        *self.by_priority.entry(priority).or_default() += 1;
    }

    /// Count a delivery. `waited_ms` is the buffer residency, `None` for handoffs.
    pub fn record_delivered(&mut self, waited_ms: Option<u128>) {
        self.delivered += 1;
        if let Some(waited) = waited_ms {
            self.total_wait_ms += waited;
            self.waited += 1;
        }
    }

    /// Count a capacity rejection.
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Count an error reported to a caller.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Count messages removed without delivery.
    pub fn record_cleared(&mut self, count: usize) {
        self.cleared += u64::try_from(count).unwrap_or(u64::MAX);
    }

    /// Build a snapshot. Buffer-owned figures are passed in by the queue.
    #[allow(clippy::cast_precision_loss)] // millisecond averages tolerate rounding
    pub fn snapshot(&self, buffer_len: usize, expired: u64) -> QueueStats {
        let average_wait_ms = if self.waited == 0 {
            0.0
        } else {
            self.total_wait_ms as f64 / self.waited as f64
        };
        QueueStats {
            total_accepted: self.accepted,
            handoffs: self.handoffs,
            delivered: self.delivered,
            expired,
            rejected: self.rejected,
            cleared: self.cleared,
            error_count: self.errors,
            by_kind: self
                .by_kind
                .iter()
                .map(|(kind, count)| ((*kind).to_string(), *count))
                .collect(),
            by_priority: self
                .by_priority
                .iter()
                .map(|(priority, count)| (priority.name().to_string(), *count))
                .collect(),
            average_wait_ms,
            buffer_len,
        }
    }
}
