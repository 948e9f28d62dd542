use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use harvest_api::{build_router, log_filter, AppState};
use harvest_common::Config;
use harvest_scout::{ApifyActorService, CommentReader, ScrapeOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = log_filter()?;
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env()?;

    let store = harvest_store::connect(&config.storage)
        .await
        .context("Failed to open comment store")?;

    let actors = Arc::new(ApifyActorService::new(
        config.apify_base_url.clone(),
        config.apify_actor_id.clone(),
    ));
    let orchestrator = ScrapeOrchestrator::new(actors, store.clone(), config.poll)
        .with_default_credential(config.default_apify_token.clone());

    let state = Arc::new(AppState {
        orchestrator,
        reader: CommentReader::new(store),
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!(
        actor = %config.apify_actor_id,
        poll_interval_secs = config.poll.interval.as_secs(),
        poll_max_attempts = config.poll.max_attempts,
        "Comment harvester starting on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
