//! Gateway observability events — one per call attempt, broadcast to any
//! subscriber (SSE streamer, log sink, test harness) over a Tokio broadcast
//! channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimited,
    ContextLimit,
    Auth,
    Timeout,
    ContentFilter,
    TransientNetwork,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayEvent {
    AttemptStarted {
        provider: String,
        model: String,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },
    AttemptSucceeded {
        provider: String,
        model: String,
        attempt: u32,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    },
    AttemptFailed {
        provider: String,
        model: String,
        attempt: u32,
        category: ErrorCategory,
        message: String,
        timestamp: DateTime<Utc>,
    },
    FailedOver {
        from_provider: String,
        to_provider: String,
        timestamp: DateTime<Utc>,
    },
    CircuitOpened {
        provider: String,
        timestamp: DateTime<Utc>,
    },
    AllProvidersExhausted {
        providers_tried: Vec<String>,
        timestamp: DateTime<Utc>,
    },
}

/// Shared reference to a [`GatewayEventBus`].
pub type SharedEventBus = Arc<GatewayEventBus>;

/// Broadcasts per-attempt gateway events to any interested subscriber.
/// Publishing with zero subscribers is not an error.
pub struct GatewayEventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl GatewayEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn shared() -> SharedEventBus {
        Arc::new(Self::new())
    }

    pub fn publish(&self, event: GatewayEvent) {
        match self.sender.send(event) {
            Ok(count) => debug!(receivers = count, "gateway event published"),
            Err(_) => debug!("gateway event published with no receivers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for GatewayEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = GatewayEventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(GatewayEvent::AttemptStarted {
            provider: "primary".to_string(),
            model: "gpt-4o-mini".to_string(),
            attempt: 1,
            timestamp: Utc::now(),
        });
        let event = rx.recv().await.unwrap();
        match event {
            GatewayEvent::AttemptStarted { provider, .. } => assert_eq!(provider, "primary"),
            _ => panic!("unexpected event variant"),
        }
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = GatewayEventBus::new();
        bus.publish(GatewayEvent::CircuitOpened {
            provider: "primary".to_string(),
            timestamp: Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
