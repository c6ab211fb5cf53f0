//! Process-wide application state: one gateway handle, one session store,
//! one metrics ring buffer, shared by every route handler behind `Arc`.
//! Mirrors §5's naming of the three shared-mutable-state structures (health
//! map, session store, metrics ring buffer) and their lock ordering.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use canvas_core::gateway::events::GatewayEvent;
use canvas_core::gateway::ProviderGateway;
use canvas_core::metrics::{MetricsEntry, MetricsOutcome, MetricsRingBuffer};
use canvas_core::session::{spawn_sweeper, ConversationStore};

use crate::config::ServiceConfig;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ProviderGateway>,
    pub sessions: Arc<ConversationStore>,
    pub metrics: Arc<MetricsRingBuffer>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        let gateway = Arc::new(ProviderGateway::new(config.gateway.clone()));
        let sessions = ConversationStore::shared(config.session_ttl);
        let metrics = Arc::new(MetricsRingBuffer::new());

        spawn_sweeper(sessions.clone(), config.session_sweep_interval);
        spawn_metrics_bridge(gateway.clone(), metrics.clone());

        Self { gateway, sessions, metrics, started_at: Instant::now() }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Subscribe to the gateway's event bus and record one [`MetricsEntry`] per
/// completed attempt. `GatewayEvent` carries no request-correlation id of
/// its own (it is addressed per call-attempt, not per inbound HTTP
/// request), so this task pairs each `AttemptSucceeded`/`AttemptFailed`
/// with the `AttemptStarted` it followed, keyed by `(provider, model,
/// attempt)`, and synthesizes a request id from a monotonically increasing
/// counter at that point.
fn spawn_metrics_bridge(gateway: Arc<ProviderGateway>, metrics: Arc<MetricsRingBuffer>) {
    let mut rx = gateway.events().subscribe();
    tokio::spawn(async move {
        let mut in_flight: HashMap<(String, String, u32), String> = HashMap::new();
        let mut next_request_id: u64 = 1;
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };
            match event {
                GatewayEvent::AttemptStarted { provider, model, attempt, .. } => {
                    let request_id = format!("req-{next_request_id}");
                    next_request_id += 1;
                    in_flight.insert((provider, model, attempt), request_id);
                }
                GatewayEvent::AttemptSucceeded { provider, model, attempt, latency_ms, timestamp } => {
                    let request_id = in_flight
                        .remove(&(provider.clone(), model.clone(), attempt))
                        .unwrap_or_else(|| "req-unknown".to_string());
                    metrics.record(MetricsEntry {
                        request_id,
                        provider,
                        model,
                        outcome: MetricsOutcome::Success,
                        latency_ms,
                        retry_index: attempt.saturating_sub(1),
                        timestamp,
                    });
                }
                GatewayEvent::AttemptFailed { provider, model, attempt, timestamp, .. } => {
                    let request_id = in_flight
                        .remove(&(provider.clone(), model.clone(), attempt))
                        .unwrap_or_else(|| "req-unknown".to_string());
                    metrics.record(MetricsEntry {
                        request_id,
                        provider,
                        model,
                        outcome: MetricsOutcome::Failure,
                        latency_ms: 0,
                        retry_index: attempt.saturating_sub(1),
                        timestamp,
                    });
                }
                GatewayEvent::FailedOver { .. }
                | GatewayEvent::CircuitOpened { .. }
                | GatewayEvent::AllProvidersExhausted { .. } => {}
            }
        }
    });
}
