//! Provider Gateway — the single point every AI call passes through.
//!
//! Owns the provider table, the per-provider circuit breakers, the retry and
//! failover ladder, and the observability event bus. Callers never talk to
//! [`client::ProviderClient`] directly; they go through [`ProviderGateway`],
//! which is the thing that actually enforces the resilience contract.

pub mod circuit_breaker;
pub mod client;
pub mod config;
pub mod events;
pub mod normalize;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::sync::Semaphore;

use crate::errors::{CoreError, CoreResult, ErrorKind};

pub use client::GenerateOptions;
use client::{ProviderClient, TransportError};
use config::{GatewayConfig, ProviderSpec};
use events::{ErrorCategory as EventErrorCategory, GatewayEvent, GatewayEventBus, SharedEventBus};
use health::ProviderHealth;

pub mod health;

pub struct ProviderGateway {
    config: GatewayConfig,
    health: health::ProviderHealthStore,
    client: ProviderClient,
    events: SharedEventBus,
    model_semaphore: Arc<Semaphore>,
}

impl ProviderGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let health = health::ProviderHealthStore::new(
            config.providers.iter().map(|p| p.name.clone()),
            config.failure_threshold,
            config.reset_timeout,
        );
        let model_semaphore = Arc::new(Semaphore::new(config.max_concurrent_model_calls.max(1)));
        Self {
            config,
            health,
            client: ProviderClient::new(),
            events: GatewayEventBus::shared(),
            model_semaphore,
        }
    }

    pub fn events(&self) -> SharedEventBus {
        self.events.clone()
    }

    /// Shared bound on concurrent model calls across the Analyzer, Suggestion
    /// Engine, and Regenerator (§5's `MAX_CONCURRENT_MODEL_CALLS`). Callers
    /// acquire a permit before invoking any `generate_*` method and hold it
    /// for the duration of the call.
    pub fn model_call_semaphore(&self) -> Arc<Semaphore> {
        self.model_semaphore.clone()
    }

    pub fn health_snapshot(&self) -> Vec<ProviderHealth> {
        self.health.snapshot_all()
    }

    /// Reset every provider's circuit breaker. Exposed for operator
    /// recovery actions (e.g. an admin endpoint), not called in the
    /// ordinary request path.
    pub fn reset_all_circuits(&self) {
        self.health.reset_all();
    }

    /// Generate free-form text, with retry and provider failover.
    pub async fn generate_text(&self, system_prompt: &str, user_prompt: &str) -> CoreResult<String> {
        self.generate_text_with(system_prompt, user_prompt, &GenerateOptions::default())
            .await
    }

    /// Same as [`Self::generate_text`] with explicit temperature/max-tokens.
    pub async fn generate_text_with(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> CoreResult<String> {
        self.call_with_failover(|provider| {
            let client = self.client.clone();
            let system_prompt = system_prompt.to_string();
            let user_prompt = user_prompt.to_string();
            let provider = provider.clone();
            let options = options.clone();
            async move {
                client
                    .generate_text(&provider, &system_prompt, &user_prompt, &options)
                    .await
            }
        })
        .await
    }

    /// Generate JSON-shaped output, normalized (fence-stripped, balanced
    /// span extracted) and parsed into a [`serde_json::Value`]. Callers run
    /// the result through `schema::safe_parse_value` for their concrete
    /// type.
    pub async fn generate_object(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> CoreResult<serde_json::Value> {
        self.generate_object_with(system_prompt, user_prompt, &GenerateOptions::default())
            .await
    }

    /// Same as [`Self::generate_object`] with explicit temperature/max-tokens.
    pub async fn generate_object_with(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> CoreResult<serde_json::Value> {
        let raw = self
            .call_with_failover(|provider| {
                let client = self.client.clone();
                let system_prompt = system_prompt.to_string();
                let user_prompt = user_prompt.to_string();
                let provider = provider.clone();
                let options = options.clone();
                async move {
                    client
                        .generate_object(&provider, &system_prompt, &user_prompt, &options)
                        .await
                }
            })
            .await?;

        let normalized = normalize::normalize_json_response(&raw).ok_or_else(|| {
            CoreError::new(
                ErrorKind::AiGeneration,
                "model response contained no recognizable JSON",
            )
        })?;

        serde_json::from_str(&normalized).map_err(|e| {
            CoreError::new(ErrorKind::AiGeneration, format!("failed to parse model JSON: {e}"))
        })
    }

    /// Stream text deltas from the highest-priority available provider.
    ///
    /// Streaming responses are not retried mid-stream: once the first byte
    /// has been forwarded to a caller there is no way to transparently swap
    /// providers without the caller seeing a seam, so this selects one
    /// provider up front and surfaces a single error if it fails outright.
    pub async fn stream_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> CoreResult<Pin<Box<dyn Stream<Item = CoreResult<String>> + Send>>> {
        let providers = self.config.providers_by_priority();
        let provider = providers
            .into_iter()
            .find(|p| self.health.is_available(&p.name))
            .ok_or_else(|| CoreError::new(ErrorKind::CircuitOpenAll, "no provider is available"))?
            .clone();

        let stream = self
            .client
            .generate_stream(&provider, system_prompt, user_prompt)
            .await
            .map_err(|e| transport_to_core_error(&e, &provider))?;

        let health_provider = provider.name.clone();
        let events = self.events.clone();
        let mapped = stream.map(move |item| {
            item.map_err(|e| {
                events.publish(GatewayEvent::AttemptFailed {
                    provider: health_provider.clone(),
                    model: provider.model.clone(),
                    attempt: 1,
                    category: e.category.clone(),
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                transport_to_core_error(&e, &provider)
            })
        });

        Ok(Box::pin(mapped))
    }

    async fn call_with_failover<F, Fut>(&self, mut call: F) -> CoreResult<String>
    where
        F: FnMut(&ProviderSpec) -> Fut,
        Fut: std::future::Future<Output = Result<String, TransportError>>,
    {
        let providers = self.config.providers_by_priority();
        let mut tried: Vec<String> = Vec::new();
        let mut last_err: Option<TransportError> = None;

        for attempt in 0..=self.config.max_retries {
            let mut any_available = false;

            for provider in &providers {
                if !self.health.is_available(&provider.name) {
                    continue;
                }
                any_available = true;
                if !tried.iter().any(|name| name == &provider.name) {
                    tried.push(provider.name.clone());
                }

                self.events.publish(GatewayEvent::AttemptStarted {
                    provider: provider.name.clone(),
                    model: provider.model.clone(),
                    attempt: attempt + 1,
                    timestamp: Utc::now(),
                });
                let started = Instant::now();

                match call(*provider).await {
                    Ok(text) => {
                        self.health.record_success(&provider.name);
                        self.events.publish(GatewayEvent::AttemptSucceeded {
                            provider: provider.name.clone(),
                            model: provider.model.clone(),
                            attempt: attempt + 1,
                            latency_ms: started.elapsed().as_millis() as u64,
                            timestamp: Utc::now(),
                        });
                        return Ok(text);
                    }
                    Err(e) => {
                        self.health
                            .record_failure(&provider.name, e.counts_against_circuit());
                        self.events.publish(GatewayEvent::AttemptFailed {
                            provider: provider.name.clone(),
                            model: provider.model.clone(),
                            attempt: attempt + 1,
                            category: e.category.clone(),
                            message: e.message.clone(),
                            timestamp: Utc::now(),
                        });
                        if !self.health.is_available(&provider.name) {
                            self.events.publish(GatewayEvent::CircuitOpened {
                                provider: provider.name.clone(),
                                timestamp: Utc::now(),
                            });
                        }

                        last_err = Some(e);
                        // Move on to the next provider in this same sweep;
                        // retries are a whole extra pass, not per-provider.
                    }
                }
            }

            if !any_available {
                break;
            }

            if attempt < self.config.max_retries {
                tokio::time::sleep(client::backoff_delay(
                    self.config.initial_retry_delay,
                    self.config.backoff_factor,
                    attempt,
                ))
                .await;
            }
        }

        self.events.publish(GatewayEvent::AllProvidersExhausted {
            providers_tried: tried.clone(),
            timestamp: Utc::now(),
        });

        Err(match last_err {
            Some(e) => transport_to_core_error(&e, &ProviderSpec {
                name: tried.last().cloned().unwrap_or_default(),
                model: String::new(),
                base_url: String::new(),
                api_key: String::new(),
                timeout: std::time::Duration::from_secs(0),
                weight: 0,
            })
            .with_suggestion("all configured providers were exhausted")
            .non_retryable(),
            None => CoreError::new(
                ErrorKind::CircuitOpenAll,
                "no provider had a closed circuit".to_string(),
            ),
        })
    }
}

fn transport_to_core_error(err: &TransportError, provider: &ProviderSpec) -> CoreError {
    let kind = match err.category {
        EventErrorCategory::RateLimited => ErrorKind::RateLimited,
        EventErrorCategory::ContextLimit => ErrorKind::ContextLimit,
        EventErrorCategory::Auth => ErrorKind::AuthConfig,
        EventErrorCategory::Timeout => ErrorKind::Timeout,
        EventErrorCategory::ContentFilter => ErrorKind::ContentFilter,
        EventErrorCategory::TransientNetwork => ErrorKind::ProviderOutage,
        EventErrorCategory::Other => ErrorKind::AiGeneration,
    };
    let mut core_err = CoreError::new(kind, err.message.clone()).with_provider(provider.name.clone());
    if !provider.model.is_empty() {
        core_err = core_err.with_model(provider.model.clone());
    }
    if let Some(secs) = err.retry_after_s {
        core_err = core_err.with_retry_after(secs);
    }
    core_err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            providers: vec![
                ProviderSpec {
                    name: "primary".into(),
                    model: "test-model".into(),
                    base_url: "http://127.0.0.1:1".into(),
                    api_key: "test".into(),
                    timeout: Duration::from_millis(50),
                    weight: 10,
                },
                ProviderSpec {
                    name: "secondary".into(),
                    model: "test-model".into(),
                    base_url: "http://127.0.0.1:1".into(),
                    api_key: "test".into(),
                    timeout: Duration::from_millis(50),
                    weight: 5,
                },
            ],
            failure_threshold: 2,
            reset_timeout: Duration::from_secs(60),
            max_retries: 0,
            initial_retry_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
            disable_failover: false,
            observability_proxy: None,
            max_concurrent_model_calls: 8,
        }
    }

    #[test]
    fn fresh_gateway_reports_all_providers_healthy() {
        let gateway = ProviderGateway::new(test_config());
        let snapshot = gateway.health_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|p| p.available));
    }

    #[test]
    fn reset_all_circuits_restores_availability() {
        let gateway = ProviderGateway::new(test_config());
        for _ in 0..2 {
            gateway.health.record_failure("primary", true);
        }
        assert!(!gateway.health.is_available("primary"));
        gateway.reset_all_circuits();
        assert!(gateway.health.is_available("primary"));
    }
}
