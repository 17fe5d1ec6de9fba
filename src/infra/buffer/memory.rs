//! In-memory priority buffer with lazy TTL expiry.

use std::collections::{BTreeMap, VecDeque};

use crate::core::Message;

/// A message waiting in the buffer, stamped with its insertion time.
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    /// The buffered message.
    pub message: Message,
    /// Insertion timestamp in milliseconds since epoch.
    pub buffered_at_ms: u128,
}

/// Priority buffer keeping one FIFO list per priority class.
///
/// Classes are kept in a `BTreeMap` keyed by the numeric priority, so the
/// front of the buffer is the oldest entry of the most urgent non-empty class.
/// Insertion is O(log c) for c classes and FIFO within a class is structural,
/// not derived from timestamps.
pub struct PriorityBuffer {
    classes: BTreeMap<u8, VecDeque<BufferedMessage>>,
    len: usize,
    priority_ordering: bool,
    ttl_ms: Option<u64>,
    expired_total: u64,
}

impl PriorityBuffer {
    /// Create an empty buffer. `ttl_ms` of `None` or `Some(0)` disables expiry;
    /// with `priority_ordering` off every message shares one FIFO class.
    pub fn new(priority_ordering: bool, ttl_ms: Option<u64>) -> Self {
        Self {
            classes: BTreeMap::new(),
            len: 0,
            priority_ordering,
            ttl_ms: ttl_ms.filter(|ttl| *ttl > 0),
            expired_total: 0,
        }
    }

    fn class_of(&self, message: &Message) -> u8 {
        if self.priority_ordering {
            message.priority().as_u8()
        } else {
            0
        }
    }

    fn is_expired(&self, entry: &BufferedMessage, now_ms: u128) -> bool {
        self.ttl_ms
            .is_some_and(|ttl| now_ms.saturating_sub(entry.message.created_at_ms()) > u128::from(ttl))
    }

    /// Append behind every buffered message of equal or more urgent priority.
    pub fn insert(&mut self, message: Message, now_ms: u128) {
        let class = self.class_of(&message);
        self.classes.entry(class).or_default().push_back(BufferedMessage {
            message,
            buffered_at_ms: now_ms,
        });
        self.len += 1;
    }

    /// Put a message back at the head of its class.
    pub fn requeue(&mut self, message: Message, now_ms: u128) {
        let class = self.class_of(&message);
        self.classes.entry(class).or_default().push_front(BufferedMessage {
            message,
            buffered_at_ms: now_ms,
        });
        self.len += 1;
    }

    /// Drop expired entries sitting at the front until a live one is found.
    /// Afterwards the buffer is either empty or its front is live.
    pub fn discard_expired_front(&mut self, now_ms: u128) {
        let Some(ttl) = self.ttl_ms else {
            return;
        };
        while let Some(mut first) = self.classes.first_entry() {
            let expired = first
                .get()
                .front()
                .is_some_and(|entry| now_ms.saturating_sub(entry.message.created_at_ms()) > u128::from(ttl));
            if !expired {
                return;
            }
            first.get_mut().pop_front();
            if first.get().is_empty() {
                first.remove();
            }
            self.len -= 1;
            self.expired_total += 1;
        }
    }

    /// Most urgent, earliest live message.
    pub fn peek_front(&mut self, now_ms: u128) -> Option<&BufferedMessage> {
        self.discard_expired_front(now_ms);
        self.classes.values().next().and_then(VecDeque::front)
    }

    /// Remove and return the most urgent, earliest live message.
    pub fn pop_front(&mut self, now_ms: u128) -> Option<BufferedMessage> {
        self.discard_expired_front(now_ms);
        let mut first = self.classes.first_entry()?;
        let entry = first.get_mut().pop_front();
        if first.get().is_empty() {
            first.remove();
        }
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Remove every expired entry and return how many were dropped.
    pub fn prune_expired(&mut self, now_ms: u128) -> usize {
        if self.ttl_ms.is_none() {
            return 0;
        }
        let before = self.len;
        let mut classes = std::mem::take(&mut self.classes);
        for entries in classes.values_mut() {
            entries.retain(|entry| !self.is_expired(entry, now_ms));
        }
        classes.retain(|_, entries| !entries.is_empty());
        self.classes = classes;
        self.len = self.classes.values().map(VecDeque::len).sum();
        let removed = before - self.len;
        self.expired_total += u64::try_from(removed).unwrap_or(u64::MAX);
        removed
    }

    /// Remove everything and return how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.len;
        self.classes.clear();
        self.len = 0;
        removed
    }

    /// Number of buffered entries, including not-yet-discovered expired ones.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is buffered.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total entries dropped for exceeding the TTL.
    pub const fn expired_total(&self) -> u64 {
        self.expired_total
    }
}
