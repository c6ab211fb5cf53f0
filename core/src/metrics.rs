//! Metrics ring buffer — the third of the three shared-mutable-state
//! structures named in §5 (alongside the provider health map and the
//! session store). Capped at 1,000 entries; oldest evicted on overflow.
//!
//! Fed by subscribing to the gateway's [`crate::gateway::events::GatewayEvent`]
//! bus and recording one entry per attempt; exposed read-only for a
//! diagnostics endpoint.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const CAPACITY: usize = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsEntry {
    pub request_id: String,
    pub provider: String,
    pub model: String,
    pub outcome: MetricsOutcome,
    pub latency_ms: u64,
    pub retry_index: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsOutcome {
    Success,
    Failure,
}

/// Fixed-capacity ring buffer of the most recent gateway attempts.
pub struct MetricsRingBuffer {
    entries: Mutex<VecDeque<MetricsEntry>>,
}

impl MetricsRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(CAPACITY)),
        }
    }

    pub fn record(&self, entry: MetricsEntry) {
        let mut entries = self.entries.lock().expect("metrics ring buffer mutex poisoned");
        if entries.len() >= CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn snapshot(&self) -> Vec<MetricsEntry> {
        self.entries
            .lock()
            .expect("metrics ring buffer mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("metrics ring buffer mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
