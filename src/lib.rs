// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod ask;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod knowledge;
pub mod metrics;
pub mod news;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::ask::{AskOutcome, KnowledgeService};
pub use crate::cache::TtlCache;
pub use crate::ingest::types::{FeedSource, Lang, NewsItem};
pub use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
pub use crate::news::NewsService;
