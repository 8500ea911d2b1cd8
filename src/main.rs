//! Crypto News Core binary entrypoint.
//! Boots the Axum HTTP server: config, shared services, background refresh,
//! routes, and the Prometheus endpoint.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_news_core::api::{self, AppState};
use crypto_news_core::ask::{build_answer_client, KnowledgeService};
use crypto_news_core::config::AppConfig;
use crypto_news_core::ingest::scheduler::spawn_refresh_scheduler;
use crypto_news_core::knowledge::KnowledgeBase;
use crypto_news_core::metrics::Metrics;
use crypto_news_core::news::NewsService;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_CORE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_CORE_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crypto_news_core=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::load();
    tracing::info!(?cfg, "starting crypto-news-core");

    let metrics = Metrics::init(cfg.cache_ttl_secs);

    let news = Arc::new(NewsService::with_http(Duration::from_secs(
        cfg.cache_ttl_secs,
    )));
    let kb = Arc::new(KnowledgeBase::load(&cfg.knowledge_path));
    let knowledge = Arc::new(KnowledgeService::new(
        kb,
        build_answer_client(),
        cfg.match_threshold,
    ));

    // Fires immediately on startup, then every interval for the process
    // lifetime. Held by the runtime; aborted implicitly at shutdown.
    let _refresh = spawn_refresh_scheduler(
        news.clone(),
        Duration::from_secs(cfg.refresh_interval_secs),
    );

    let state = AppState { news, knowledge };
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
