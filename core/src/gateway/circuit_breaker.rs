//! Per-provider circuit breaker.
//!
//! Two states only — `Closed` and `Open` — per the gateway's contract: there
//! is no half-open probe state, the first call after the cooldown elapses is
//! simply treated as a trial against the normal `Closed` path.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

/// Circuit breaker state for a single provider.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_count: u32,
    circuit_open_time: Option<Instant>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_count: 0,
            circuit_open_time: None,
            failure_threshold,
            reset_timeout,
        }
    }

    /// Record a success. Always resets the circuit to `Closed` with a zeroed
    /// failure count.
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.circuit_open_time = None;
    }

    /// Record a failure. May trip the circuit open if `failure_threshold` is
    /// crossed. Callers must not call this for `auth`/`content_filter`
    /// errors — those do not count against the circuit.
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        if self.failure_count >= self.failure_threshold && self.circuit_open_time.is_none() {
            self.circuit_open_time = Some(Instant::now());
        }
    }

    /// Force the circuit closed with a zeroed failure count.
    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.circuit_open_time = None;
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Current state. Eagerly closes the circuit (and clears the failure
    /// count) once `reset_timeout` has elapsed since it opened — this is the
    /// "first call after reset is a trial" behavior, observed as a side
    /// effect of reading the state.
    pub fn state(&mut self) -> CircuitState {
        match self.circuit_open_time {
            Some(opened_at) if opened_at.elapsed() >= self.reset_timeout => {
                self.failure_count = 0;
                self.circuit_open_time = None;
                CircuitState::Closed
            }
            Some(_) => CircuitState::Open,
            None => CircuitState::Closed,
        }
    }

    pub fn is_available(&mut self) -> bool {
        matches!(self.state(), CircuitState::Closed)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let mut cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn opens_at_exactly_threshold() {
        let mut cb = CircuitBreaker::new(5, Duration::from_secs(9999));
        for _ in 0..4 {
            cb.record_failure();
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failure_count(), 5);
    }

    #[test]
    fn threshold_minus_one_then_success_resets_to_zero() {
        let mut cb = CircuitBreaker::new(5, Duration::from_secs(9999));
        for _ in 0..4 {
            cb.record_failure();
        }
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn failure_count_monotonic_until_threshold() {
        let mut cb = CircuitBreaker::new(100, Duration::from_secs(9999));
        let mut last = 0;
        for _ in 0..10 {
            cb.record_failure();
            assert!(cb.failure_count() > last);
            last = cb.failure_count();
        }
    }

    #[test]
    fn reset_timeout_auto_closes() {
        let mut cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        // elapsed() on a zero timeout is satisfied essentially immediately.
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn manual_reset_forces_closed() {
        let mut cb = CircuitBreaker::new(1, Duration::from_secs(9999));
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }
}
