// src/ingest/sources.rs
//! Static source registry grouped by language. Pure data, no error paths.
//!
//! The zh list reuses English feeds: the Chinese-language RSS endpoints are
//! unreliable, so zh readers get the same upstream content under localized
//! source names. The declared feed language stays `en` in that case.

use crate::ingest::types::{FeedSource, Lang};

pub const EN_SOURCES: &[FeedSource] = &[
    FeedSource {
        name: "CoinDesk",
        url: "https://www.coindesk.com/arc/outboundfeeds/rss/",
        lang: Lang::En,
    },
    FeedSource {
        name: "CoinTelegraph",
        url: "https://cointelegraph.com/rss",
        lang: Lang::En,
    },
    FeedSource {
        name: "BitcoinMagazine",
        url: "https://bitcoinmagazine.com/.rss",
        lang: Lang::En,
    },
    FeedSource {
        name: "CryptoSlate",
        url: "https://cryptoslate.com/feed/",
        lang: Lang::En,
    },
    FeedSource {
        name: "Decrypt",
        url: "https://decrypt.co/feed",
        lang: Lang::En,
    },
];

pub const ZH_SOURCES: &[FeedSource] = &[
    FeedSource {
        name: "CoinDesk中文",
        url: "https://www.coindesk.com/arc/outboundfeeds/rss/",
        lang: Lang::En,
    },
    FeedSource {
        name: "CoinTelegraph中文",
        url: "https://cointelegraph.com/rss",
        lang: Lang::En,
    },
    FeedSource {
        name: "CryptoSlate中文",
        url: "https://cryptoslate.com/feed/",
        lang: Lang::En,
    },
    FeedSource {
        name: "Decrypt中文",
        url: "https://decrypt.co/feed",
        lang: Lang::En,
    },
    FeedSource {
        name: "News.Bitcoin.com",
        url: "https://news.bitcoin.com/feed/",
        lang: Lang::En,
    },
];

/// Sources serving the given language key.
pub fn sources_for(lang: Lang) -> &'static [FeedSource] {
    match lang {
        Lang::En => EN_SOURCES,
        Lang::Zh => ZH_SOURCES,
    }
}
