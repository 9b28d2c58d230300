//! Volatile state store: banlist, log buffer and counters
//!
//! Nothing here is persisted. A fresh [`Store`] is created at process start
//! and lives until the process exits.

use std::collections::VecDeque;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::constants::LOG_CAPACITY;

/// Current wall-clock time as an ISO-8601 string (UTC, millisecond precision)
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Set of banned IP strings, reported in insertion order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Banlist {
    entries: Vec<String>,
}

impl Banlist {
    /// Insert an IP. Returns `false` if it was already present.
    pub fn insert(&mut self, ip: &str) -> bool {
        if self.contains(ip) {
            return false;
        }
        self.entries.push(ip.to_string());
        true
    }

    /// Remove an IP. Returns `false` if it was absent.
    pub fn remove(&mut self, ip: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|x| x != ip);
        self.entries.len() != before
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.entries.iter().any(|x| x == ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.clone()
    }
}

/// A single timestamped log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub text: String,
}

impl LogEntry {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            timestamp: now_iso8601(),
            text: text.into(),
        }
    }
}

/// Bounded newest-first log
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    /// Capacity is clamped to at least one entry
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity,
        }
    }

    /// Push an entry at the front, evicting the oldest one past capacity
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest entry, if any
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

/// Request counters, saturating at `u64::MAX`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub calls: u64,
    pub blocked: u64,
}

/// Snapshot returned by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub blocked: u64,
    pub banlist: Vec<String>,
    pub logs: Vec<LogEntry>,
}

/// Banlist + log buffer + counters
#[derive(Debug, Clone, Default)]
pub struct Store {
    banlist: Banlist,
    logs: LogBuffer,
    counters: Counters,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose log buffer keeps at most `capacity` entries
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            logs: LogBuffer::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn add_to_banlist(&mut self, ip: &str) -> bool {
        self.banlist.insert(ip)
    }

    pub fn remove_from_banlist(&mut self, ip: &str) -> bool {
        self.banlist.remove(ip)
    }

    pub fn append_log(&mut self, text: impl Into<String>) {
        self.logs.push(LogEntry::now(text));
    }

    pub fn increment_calls(&mut self) {
        self.counters.calls = self.counters.calls.saturating_add(1);
    }

    pub fn increment_blocked(&mut self) {
        self.counters.blocked = self.counters.blocked.saturating_add(1);
    }

    /// Membership test that also bumps the counters.
    ///
    /// The read and both increments happen against the same `&mut self`, so a
    /// caller holding the write lock sees them as one step.
    pub fn check(&mut self, ip: &str) -> bool {
        let blocked = self.banlist.contains(ip);
        self.increment_calls();
        if blocked {
            self.increment_blocked();
        }
        blocked
    }

    pub fn banlist(&self) -> &Banlist {
        &self.banlist
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.counters.calls,
            blocked: self.counters.blocked,
            banlist: self.banlist.to_vec(),
            logs: self.logs.iter().cloned().collect(),
        }
    }
}
