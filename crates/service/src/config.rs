//! Service-level configuration — everything the HTTP surface needs that
//! isn't already owned by [`canvas_core::gateway::config::GatewayConfig`].
//! Hand-rolled `std::env::var` parsing to match the gateway config's own
//! style (§6's expansion note: no `config`/`figment` crate).

use std::time::Duration;

use canvas_core::gateway::config::GatewayConfig;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gateway: GatewayConfig,
    pub bind_addr: String,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            gateway: GatewayConfig::from_env(),
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:8080"),
            session_ttl: Duration::from_secs(env_u64("SESSION_TTL_MINUTES", 30) * 60),
            session_sweep_interval: Duration::from_secs(60),
        }
    }
}
