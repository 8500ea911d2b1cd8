//! # News Service
//! Cache-backed merged news per language key. A request hits the TTL cache;
//! on miss it fans out to every source of that language, merges, stores, and
//! returns the fresh snapshot. Concurrent misses may each fetch; results are
//! interchangeable snapshots, so last writer wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::TtlCache;
use crate::ingest::providers::rss::RssProvider;
use crate::ingest::sources::sources_for;
use crate::ingest;
use crate::ingest::types::{Lang, NewsItem, SourceProvider};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LangCacheStatus {
    pub cached: bool,
    pub count: usize,
    pub seconds_remaining: u64,
}

pub struct NewsService {
    providers: HashMap<Lang, Vec<Box<dyn SourceProvider>>>,
    cache: TtlCache<Arc<Vec<NewsItem>>>,
}

impl NewsService {
    pub fn new(providers: HashMap<Lang, Vec<Box<dyn SourceProvider>>>, ttl: Duration) -> Self {
        Self {
            providers,
            cache: TtlCache::new(ttl),
        }
    }

    /// Production wiring: one HTTP RSS provider per registry source.
    pub fn with_http(ttl: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("crypto-news-core/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");

        let mut providers: HashMap<Lang, Vec<Box<dyn SourceProvider>>> = HashMap::new();
        for lang in Lang::ALL {
            let provs = sources_for(lang)
                .iter()
                .map(|s| Box::new(RssProvider::from_http(*s, client.clone())) as Box<dyn SourceProvider>)
                .collect();
            providers.insert(lang, provs);
        }
        Self::new(providers, ttl)
    }

    /// Cache-backed read. Misses (and expired entries) trigger a full
    /// fetch+merge before returning.
    pub async fn merged_news(&self, lang: Lang) -> Arc<Vec<NewsItem>> {
        let key = lang.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%lang, count = hit.len(), "news cache hit");
            return hit;
        }
        self.refresh(lang).await
    }

    /// Force repopulation for one language key regardless of cache state.
    /// Source failures degrade to a smaller (possibly empty) snapshot.
    pub async fn refresh(&self, lang: Lang) -> Arc<Vec<NewsItem>> {
        let empty: Vec<Box<dyn SourceProvider>> = Vec::new();
        let provs = self.providers.get(&lang).unwrap_or(&empty);
        let (merged, failed) = ingest::run_once(provs).await;
        tracing::info!(%lang, count = merged.len(), failed_sources = failed, "news refreshed");
        let snapshot = Arc::new(merged);
        self.cache.set(&lang.cache_key(), snapshot.clone());
        snapshot
    }

    /// Case-insensitive containment search over the cached English snapshot.
    pub async fn search(&self, keyword: &str, limit: usize) -> Vec<NewsItem> {
        let needle = keyword.to_lowercase();
        self.merged_news(Lang::En)
            .await
            .iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&needle)
                    || n.content.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn cache_status(&self) -> HashMap<String, LangCacheStatus> {
        let mut out = HashMap::new();
        for lang in Lang::ALL {
            let status = match self.cache.status(&lang.cache_key()) {
                Some((payload, secs)) => LangCacheStatus {
                    cached: true,
                    count: payload.len(),
                    seconds_remaining: secs,
                },
                None => LangCacheStatus {
                    cached: false,
                    count: 0,
                    seconds_remaining: 0,
                },
            };
            out.insert(lang.as_str().to_string(), status);
        }
        out
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn ttl_secs(&self) -> u64 {
        self.cache.ttl_secs()
    }
}
