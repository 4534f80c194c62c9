use axum::{Router, extract::DefaultBodyLimit, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;

use integration::Env;
use state::AppState;

pub mod club;
pub mod integration;
pub mod state;
pub mod store;

const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub fn app(s: AppState, env: &Env) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(club::api(s))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(env.allow_origin())
                .allow_methods(env.allow_methods())
                .allow_headers(env.allow_headers()),
        )
}

async fn health() -> StatusCode {
    StatusCode::OK
}
