// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Language tag attached to sources and items. Attached at fetch time from the
/// source descriptor, never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Zh,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Zh];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh",
        }
    }

    /// Cache key for the merged snapshot of this language.
    pub fn cache_key(&self) -> String {
        format!("news_{}", self.as_str())
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized news item. Lives only inside a cache entry; no persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    /// Source-provided guid, falling back to the link.
    pub id: String,
    pub title: String,
    /// Canonical URL; the dedup key across sources.
    pub link: String,
    /// Truncated body, at most 500 chars.
    pub content: String,
    /// Publish time in epoch milliseconds; fetch time if the feed omits it.
    pub timestamp: u64,
    pub source: String,
    pub lang: Lang,
}

/// Static descriptor of one feed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeedSource {
    pub name: &'static str,
    pub url: &'static str,
    pub lang: Lang,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &str;
}
