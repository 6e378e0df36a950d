mod error;
mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use crate::{store, Config};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::auth_routes())
        .merge(routes::asset_routes(&state))
        .layer(middleware::from_fn(security::apply_security_headers))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, addr: &str) -> Result<()> {
    let store = store::connect(&config.store)?;
    tracing::info!(backend = store.backend_name(), "Media store ready");

    let state = Arc::new(AppState::new(config, store)?);

    let limiter = state.login_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
