use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::{self, AppState};
use crate::config::HazardWatchConfig;

/// Serve the dashboard API and static frontend
pub async fn run(config: HazardWatchConfig, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .fallback_service(ServeDir::new("frontend"))
        .layer(cors);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Dashboard running at http://localhost:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
