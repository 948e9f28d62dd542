use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use harvest_scout::{CommentReader, ScrapeOrchestrator};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

pub mod rest;

pub struct AppState {
    pub orchestrator: ScrapeOrchestrator,
    pub reader: CommentReader,
}

/// `RUST_LOG` plus our defaults. TraceLayer reports status and latency at
/// debug under `tower_http`.
pub fn log_filter() -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("harvest=info".parse()?)
        .add_directive("apify_client=info".parse()?)
        .add_directive("tower_http=debug".parse()?))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "ok" }))
        // REST API
        .route("/api/scrape", post(rest::api_scrape))
        .route("/api/comments", get(rest::api_comments))
        .route("/api/runs/{run_id}/comments", get(rest::api_run_comments))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Scraped comments are never cached
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path + status + latency (tower_http, debug)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
