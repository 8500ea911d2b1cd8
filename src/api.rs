use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::ask::KnowledgeService;
use crate::ingest::sources;
use crate::ingest::types::Lang;
use crate::news::{LangCacheStatus, NewsService};

#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsService>,
    pub knowledge: Arc<KnowledgeService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(get_news))
        .route("/api/news/search", get(search_news))
        .route("/api/news/sources", get(news_sources))
        .route("/api/news/status", get(news_status))
        .route("/api/ai/ask", post(ask))
        .route("/api/ai/stats", get(knowledge_stats))
        .route("/api/ai/clear", post(knowledge_clear))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct NewsQuery {
    lang: Option<Lang>,
    limit: Option<usize>,
    source: Option<String>,
}

async fn get_news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<Value> {
    let lang = q.lang.unwrap_or(Lang::En);
    let limit = q.limit.unwrap_or(30);
    let snapshot = state.news.merged_news(lang).await;
    let data: Vec<_> = snapshot
        .iter()
        .filter(|n| q.source.as_deref().map_or(true, |s| n.source == s))
        .take(limit)
        .collect();
    Json(json!({ "success": true, "count": data.len(), "data": data }))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

async fn search_news(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Value> {
    let hits = state.news.search(&query.q, query.limit.unwrap_or(20)).await;
    Json(json!({ "success": true, "count": hits.len(), "data": hits }))
}

async fn news_sources() -> Json<Value> {
    Json(json!({
        "success": true,
        "en": sources::sources_for(Lang::En),
        "zh": sources::sources_for(Lang::Zh),
    }))
}

async fn news_status(State(state): State<AppState>) -> Json<HashMap<String, LangCacheStatus>> {
    Json(state.news.cache_status())
}

#[derive(Deserialize)]
struct AskReq {
    question: String,
    #[serde(default)]
    lang: Option<Lang>,
}

async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskReq>,
) -> (StatusCode, Json<Value>) {
    if body.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Missing question" })),
        );
    }
    let lang = body.lang.unwrap_or(Lang::En);
    match state.knowledge.ask(&body.question, lang).await {
        Ok(out) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "answer": out.answer,
                "from_cache": out.from_cache,
                "filtered": out.filtered,
            })),
        ),
        Err(e) => {
            tracing::warn!(error = ?e, "ask failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

async fn knowledge_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.knowledge.knowledge_base().stats(5);
    Json(json!({ "success": true, "stats": stats }))
}

async fn knowledge_clear(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.knowledge.knowledge_base().clear();
    Json(json!({ "success": true, "cleared": cleared }))
}
