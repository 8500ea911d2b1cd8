// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod sources;
pub mod types;

use crate::ingest::types::{NewsItem, SourceProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_items_fetched_total", "Items parsed from feeds.");
        describe_counter!(
            "news_items_merged_total",
            "Items surviving merge + dedup per run."
        );
        describe_counter!(
            "news_source_errors_total",
            "Feed fetch/parse errors (recovered per source)."
        );
        describe_histogram!("news_feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "news_last_merge_ts",
            "Unix ts when the merge pipeline last ran."
        );
    });
}

/// Clean a feed body fragment: decode HTML entities, strip tags, collapse
/// whitespace, cap at 500 chars. Used for the `content` field of every item.
pub fn clean_content(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }
    out
}

/// Flatten per-source batches, drop duplicate links (last seen wins), sort
/// newest first. Pure function, no I/O.
pub fn merge_and_dedupe(batches: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let mut by_link: HashMap<String, NewsItem> = HashMap::new();
    for batch in batches {
        for item in batch {
            by_link.insert(item.link.clone(), item);
        }
    }
    let mut merged: Vec<NewsItem> = by_link.into_values().collect();
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

/// Fetch every provider once and merge the successes. A failing source
/// contributes nothing and is logged; it never aborts the run.
/// Returns (merged items, failed source count).
pub async fn run_once(providers: &[Box<dyn SourceProvider>]) -> (Vec<NewsItem>, usize) {
    ensure_metrics_described();

    let mut batches = Vec::with_capacity(providers.len());
    let mut failed = 0usize;
    for p in providers {
        match p.fetch_latest().await {
            Ok(items) => {
                counter!("news_items_fetched_total").increment(items.len() as u64);
                tracing::debug!(source = p.name(), count = items.len(), "feed fetched");
                batches.push(items);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = p.name(), "feed error");
                counter!("news_source_errors_total").increment(1);
                failed += 1;
            }
        }
    }

    let merged = merge_and_dedupe(batches);
    counter!("news_items_merged_total").increment(merged.len() as u64);
    gauge!("news_last_merge_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    (merged, failed)
}
