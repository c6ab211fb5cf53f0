//! HTTP surface for the QA canvas orchestration service: one `AppState`
//! (gateway handle, session store, metrics ring buffer) wired to the three
//! business endpoints plus an ambient liveness probe (§6).

pub mod config;
pub mod error;
pub mod routes;
pub mod sse;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the router for a given [`AppState`]. Split out from `main` so
/// integration tests can exercise the full HTTP stack without binding a
/// real socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze-ticket", post(routes::analyze::analyze_ticket))
        .route("/api/update-canvas", post(routes::update_canvas::update_canvas))
        .route("/api/generate-suggestions", post(routes::suggestions::generate_suggestions))
        .route("/healthz", get(routes::health::healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
