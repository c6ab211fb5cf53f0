//! `GET /healthz` — ambient liveness probe (not named in spec.md, required
//! of any service in this corpus's idiom). Never returns 5xx: a degraded
//! provider fleet is still a live process.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use canvas_core::gateway::health::ProviderHealth;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub providers: Vec<ProviderHealth>,
    pub active_sessions: usize,
}

pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        providers: state.gateway.health_snapshot(),
        active_sessions: state.sessions.active_count(),
    })
}
