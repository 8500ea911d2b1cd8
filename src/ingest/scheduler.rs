// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::types::Lang;
use crate::news::NewsService;

/// Spawn the periodic cache refresh. The first tick fires immediately so a
/// cold boot warms the cache right away; after that the cadence is fixed, no
/// backoff. One language failing never stops the other or future cycles.
/// Abort the returned handle at shutdown.
pub fn spawn_refresh_scheduler(service: Arc<NewsService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for lang in Lang::ALL {
                let snapshot = service.refresh(lang).await;
                tracing::info!(
                    target: "scheduler",
                    %lang,
                    count = snapshot.len(),
                    "refresh tick"
                );
            }
            counter!("news_refresh_runs_total").increment(1);
        }
    })
}
