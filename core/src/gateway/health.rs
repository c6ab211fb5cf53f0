//! `ProviderHealthStore` — encapsulates the process-wide provider health
//! map behind per-provider critical sections.
//!
//! Per §9's redesign note ("global provider health map"): the map of which
//! providers exist is fixed at construction, so looking up *which* mutex to
//! take never itself needs a lock — only the per-provider entry does.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::circuit_breaker::CircuitBreaker;

/// Snapshot of a single provider's health, safe to serialize for the
/// `/healthz` endpoint or an observability event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub name: String,
    pub available: bool,
    pub failure_count: u32,
    #[serde(default)]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_success: Option<DateTime<Utc>>,
    pub circuit_open: bool,
    #[serde(default)]
    pub circuit_open_time: Option<DateTime<Utc>>,
}

struct ProviderEntry {
    name: String,
    breaker: CircuitBreaker,
    last_failure: Option<SystemTime>,
    last_success: Option<SystemTime>,
}

impl ProviderEntry {
    fn new(name: String, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name,
            breaker: CircuitBreaker::new(failure_threshold, reset_timeout),
            last_failure: None,
            last_success: None,
        }
    }

    fn snapshot(&mut self) -> ProviderHealth {
        let circuit_open = !self.breaker.is_available();
        ProviderHealth {
            name: self.name.clone(),
            available: !circuit_open,
            failure_count: self.breaker.failure_count(),
            last_failure: self.last_failure.map(DateTime::<Utc>::from),
            last_success: self.last_success.map(DateTime::<Utc>::from),
            circuit_open,
            circuit_open_time: None,
        }
    }
}

/// Owns one `Mutex<ProviderEntry>` per configured provider.
pub struct ProviderHealthStore {
    entries: HashMap<String, Mutex<ProviderEntry>>,
}

impl ProviderHealthStore {
    pub fn new(
        provider_names: impl IntoIterator<Item = String>,
        failure_threshold: u32,
        reset_timeout: Duration,
    ) -> Self {
        let entries = provider_names
            .into_iter()
            .map(|name| {
                let entry = ProviderEntry::new(name.clone(), failure_threshold, reset_timeout);
                (name, Mutex::new(entry))
            })
            .collect();
        Self { entries }
    }

    fn entry(&self, provider: &str) -> Option<&Mutex<ProviderEntry>> {
        self.entries.get(provider)
    }

    pub fn record_success(&self, provider: &str) {
        if let Some(m) = self.entry(provider) {
            let mut e = m.lock().expect("provider health mutex poisoned");
            e.breaker.record_success();
            e.last_success = Some(SystemTime::now());
        }
    }

    /// Record a failure. `counts_against_circuit` should be `false` for
    /// `auth`/`content_filter` errors, which are not outages.
    pub fn record_failure(&self, provider: &str, counts_against_circuit: bool) {
        if let Some(m) = self.entry(provider) {
            let mut e = m.lock().expect("provider health mutex poisoned");
            e.last_failure = Some(SystemTime::now());
            if counts_against_circuit {
                e.breaker.record_failure();
            }
        }
    }

    pub fn is_available(&self, provider: &str) -> bool {
        match self.entry(provider) {
            Some(m) => m
                .lock()
                .expect("provider health mutex poisoned")
                .breaker
                .is_available(),
            None => false,
        }
    }

    pub fn reset(&self, provider: &str) {
        if let Some(m) = self.entry(provider) {
            m.lock().expect("provider health mutex poisoned").breaker.reset();
        }
    }

    pub fn reset_all(&self) {
        for name in self.entries.keys() {
            self.reset(name);
        }
    }

    pub fn snapshot(&self, provider: &str) -> Option<ProviderHealth> {
        self.entry(provider).map(|m| {
            m.lock()
                .expect("provider health mutex poisoned")
                .snapshot()
        })
    }

    pub fn snapshot_all(&self) -> Vec<ProviderHealth> {
        let mut snapshots: Vec<ProviderHealth> = self
            .entries
            .values()
            .map(|m| m.lock().expect("provider health mutex poisoned").snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProviderHealthStore {
        ProviderHealthStore::new(
            vec!["primary".to_string(), "secondary".to_string()],
            5,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn fresh_providers_are_available() {
        let s = store();
        assert!(s.is_available("primary"));
        assert!(s.is_available("secondary"));
    }

    #[test]
    fn failures_eventually_trip_circuit() {
        let s = store();
        for _ in 0..5 {
            s.record_failure("primary", true);
        }
        assert!(!s.is_available("primary"));
        assert!(s.is_available("secondary"));
    }

    #[test]
    fn non_circuit_failures_do_not_trip() {
        let s = store();
        for _ in 0..10 {
            s.record_failure("primary", false);
        }
        assert!(s.is_available("primary"));
    }

    #[test]
    fn reset_all_restores_every_provider() {
        let s = store();
        for _ in 0..5 {
            s.record_failure("primary", true);
        }
        assert!(!s.is_available("primary"));
        s.reset_all();
        assert!(s.is_available("primary"));
    }

    #[test]
    fn unknown_provider_is_unavailable() {
        let s = store();
        assert!(!s.is_available("ghost"));
    }
}
