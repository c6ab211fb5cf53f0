use anyhow::Result;
use tracing::info;

use qa_canvas_service::config::ServiceConfig;
use qa_canvas_service::state::AppState;
use qa_canvas_service::build_router;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    info!(
        bind_addr = %config.bind_addr,
        providers = config.gateway.providers.len(),
        "qa-canvas-service starting"
    );

    let state = AppState::new(&config);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(bind_addr = %config.bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
