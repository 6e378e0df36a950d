use super::handlers;
use super::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Base64 inflates payloads by a third; leave room for the JSON envelope too.
fn upload_body_limit(state: &AppState) -> usize {
    let per_file = state
        .config
        .upload
        .max_file_size_bytes()
        .unwrap_or(10 * 1024 * 1024);
    (per_file / 3 * 4 + 1024).saturating_mul(state.config.upload.max_batch_size)
}

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

pub fn asset_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/upload",
            post(handlers::assets::upload).layer(DefaultBodyLimit::max(upload_body_limit(state))),
        )
        .route("/list", get(handlers::assets::list))
        .route("/delete", post(handlers::assets::delete))
        .route("/folders", get(handlers::assets::list_folders))
        .route("/health", get(handlers::assets::health))
}
