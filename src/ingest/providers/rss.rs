// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::clean_content;
use crate::ingest::types::{FeedSource, NewsItem, SourceProvider};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}
// <guid isPermaLink="..."> carries attributes, so the text needs its own field.
#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

fn parse_rfc2822_to_unix_ms(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp() * 1000)
        .and_then(|x| u64::try_from(x).ok())
}

/// Fetches and shapes one RSS feed into `NewsItem`s.
pub struct RssProvider {
    source: FeedSource,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RssProvider {
    /// Parse from a captured feed body; used by tests and local runs.
    pub fn from_fixture(source: FeedSource, xml: &str) -> Self {
        Self {
            source,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_http(source: FeedSource, client: reqwest::Client) -> Self {
        Self {
            source,
            mode: Mode::Http { client },
        }
    }

    fn parse_items(&self, body: &str, fetched_at_ms: u64) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(body);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing rss xml from {}", self.source.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.as_deref().unwrap_or_default().trim().to_string();
            let link = it.link.as_deref().unwrap_or_default().trim().to_string();
            // Entries without a title or link are unusable; drop them.
            if title.is_empty() || link.is_empty() {
                continue;
            }

            let id = it
                .guid
                .and_then(|g| g.value)
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| link.clone());

            out.push(NewsItem {
                id,
                title,
                content: clean_content(it.description.as_deref().unwrap_or_default()),
                timestamp: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_rfc2822_to_unix_ms)
                    .unwrap_or(fetched_at_ms),
                link,
                source: self.source.name.to_string(),
                lang: self.source.lang,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_feed_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>> {
        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        match &self.mode {
            Mode::Fixture(s) => self.parse_items(s, now_ms),
            Mode::Http { client } => {
                let body = client
                    .get(self.source.url)
                    .send()
                    .await
                    .with_context(|| format!("fetching {}", self.source.url))?
                    .text()
                    .await
                    .with_context(|| format!("reading body from {}", self.source.url))?;
                self.parse_items(&body, now_ms)
            }
        }
    }

    fn name(&self) -> &str {
        self.source.name
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Lang;

    const SRC: FeedSource = FeedSource {
        name: "TestFeed",
        url: "https://example.com/feed",
        lang: Lang::En,
    };

    const XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Test</title>
  <item>
    <title> Bitcoin climbs </title>
    <link>https://example.com/a</link>
    <guid isPermaLink="false">guid-a</guid>
    <pubDate>Mon, 06 Jan 2025 10:00:00 +0000</pubDate>
    <description><![CDATA[<p>Body&nbsp;text</p>]]></description>
  </item>
  <item>
    <title>No link entry</title>
    <pubDate>Mon, 06 Jan 2025 11:00:00 +0000</pubDate>
  </item>
</channel></rss>"#;

    #[test]
    fn parses_and_drops_linkless_entries() {
        let p = RssProvider::from_fixture(SRC, XML);
        let items = p.parse_items(XML, 42).unwrap();
        assert_eq!(items.len(), 1);
        let it = &items[0];
        assert_eq!(it.id, "guid-a");
        assert_eq!(it.title, "Bitcoin climbs");
        assert_eq!(it.content, "Body text");
        assert_eq!(it.source, "TestFeed");
        assert_eq!(it.lang, Lang::En);
    }

    #[test]
    fn missing_pubdate_falls_back_to_fetch_time() {
        let xml = r#"<rss><channel><item>
            <title>t</title><link>https://example.com/x</link>
        </item></channel></rss>"#;
        let p = RssProvider::from_fixture(SRC, xml);
        let items = p.parse_items(xml, 9_999).unwrap();
        assert_eq!(items[0].timestamp, 9_999);
        assert_eq!(items[0].id, "https://example.com/x");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let p = RssProvider::from_fixture(SRC, "not xml at all");
        assert!(p.parse_items("not xml at all", 0).is_err());
    }
}
