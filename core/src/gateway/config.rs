//! Gateway configuration — provider table and resilience knobs, loaded from
//! the environment once at process startup (mirrors the teacher's
//! `HarnessConfig::from_env` hand-rolled parsing: no `config`/`figment`
//! crate, just typed `std::env::var` reads with defaults).

use std::time::Duration;

/// A single entry in the priority-ordered provider table.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Higher weight is tried first; failover walks providers in descending
    /// weight order among those whose circuit is closed.
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct ObservabilityProxy {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub providers: Vec<ProviderSpec>,
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub max_retries: u32,
    pub initial_retry_delay: Duration,
    pub backoff_factor: f64,
    pub disable_failover: bool,
    pub observability_proxy: Option<ObservabilityProxy>,
    /// Upper bound on model calls in flight at once, shared by the Analyzer,
    /// Suggestion Engine, and Regenerator via [`super::ProviderGateway::model_call_semaphore`].
    pub max_concurrent_model_calls: usize,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl GatewayConfig {
    /// Build configuration from environment variables, per §6.
    pub fn from_env() -> Self {
        let model = env_string("AI_MODEL", "gpt-4o-mini");
        let observability_proxy = match (
            std::env::var("OBSERVABILITY_PROXY_URL").ok(),
            std::env::var("OBSERVABILITY_PROXY_API_KEY").ok(),
        ) {
            (Some(base_url), Some(api_key)) if !base_url.is_empty() && !api_key.is_empty() => {
                Some(ObservabilityProxy { base_url, api_key })
            }
            _ => None,
        };

        let primary_base = observability_proxy
            .as_ref()
            .map(|p| p.base_url.clone())
            .unwrap_or_else(|| env_string("PRIMARY_PROVIDER_BASE_URL", "https://api.openai.com/v1"));
        let secondary_base = observability_proxy
            .as_ref()
            .map(|p| p.base_url.clone())
            .unwrap_or_else(|| {
                env_string("SECONDARY_PROVIDER_BASE_URL", "https://api.anthropic.com/v1")
            });

        let primary_key = observability_proxy
            .as_ref()
            .map(|p| p.api_key.clone())
            .unwrap_or_else(|| env_string("PRIMARY_PROVIDER_API_KEY", ""));
        let secondary_key = observability_proxy
            .as_ref()
            .map(|p| p.api_key.clone())
            .unwrap_or_else(|| env_string("SECONDARY_PROVIDER_API_KEY", ""));

        let providers = vec![
            ProviderSpec {
                name: "primary".to_string(),
                model: model.clone(),
                base_url: primary_base,
                api_key: primary_key,
                timeout: Duration::from_secs(env_u64("PRIMARY_PROVIDER_TIMEOUT", 60)),
                weight: 10,
            },
            ProviderSpec {
                name: "secondary".to_string(),
                model: env_string("AI_MODEL_SECONDARY", &model),
                base_url: secondary_base,
                api_key: secondary_key,
                timeout: Duration::from_secs(env_u64("SECONDARY_PROVIDER_TIMEOUT", 60)),
                weight: 5,
            },
        ];

        Self {
            providers,
            failure_threshold: env_u32("CIRCUIT_BREAKER_THRESHOLD", 5),
            reset_timeout: Duration::from_secs(env_u64("CIRCUIT_BREAKER_RESET_TIMEOUT", 60)),
            max_retries: env_u32("MAX_RETRIES", 3),
            initial_retry_delay: Duration::from_millis(env_u64("RETRY_DELAY_MS", 1000)),
            backoff_factor: env_f64("RETRY_BACKOFF_FACTOR", 2.0),
            disable_failover: env_bool("DISABLE_FAILOVER", false),
            observability_proxy,
            max_concurrent_model_calls: env_u32("MAX_CONCURRENT_MODEL_CALLS", 8) as usize,
        }
    }

    /// Providers ordered by descending weight — the order failover walks.
    pub fn providers_by_priority(&self) -> Vec<&ProviderSpec> {
        let mut providers: Vec<&ProviderSpec> = if self.disable_failover {
            self.providers.iter().take(1).collect()
        } else {
            self.providers.iter().collect()
        };
        providers.sort_by(|a, b| b.weight.cmp(&a.weight));
        providers
    }
}
