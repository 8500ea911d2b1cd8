// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use crypto_news_core::api::{self, AppState};
use crypto_news_core::ask::{KnowledgeService, MockClient};
use crypto_news_core::ingest::providers::rss::RssProvider;
use crypto_news_core::ingest::types::{FeedSource, Lang, SourceProvider};
use crypto_news_core::knowledge::KnowledgeBase;
use crypto_news_core::news::NewsService;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn test_state(dir: &tempfile::TempDir) -> AppState {
    const FEED_A: FeedSource = FeedSource {
        name: "FeedA",
        url: "https://feed-a.example.com/rss",
        lang: Lang::En,
    };
    const FEED_B: FeedSource = FeedSource {
        name: "FeedB",
        url: "https://feed-b.example.com/rss",
        lang: Lang::En,
    };

    let mut providers: HashMap<Lang, Vec<Box<dyn SourceProvider>>> = HashMap::new();
    providers.insert(
        Lang::En,
        vec![
            Box::new(RssProvider::from_fixture(
                FEED_A,
                include_str!("fixtures/crypto_rss_a.xml"),
            )) as Box<dyn SourceProvider>,
            Box::new(RssProvider::from_fixture(
                FEED_B,
                include_str!("fixtures/crypto_rss_b.xml"),
            )),
        ],
    );

    let kb = Arc::new(KnowledgeBase::load(dir.path().join("kb.json")));
    AppState {
        news: Arc::new(NewsService::new(providers, Duration::from_secs(300))),
        knowledge: Arc::new(KnowledgeService::new(
            kb,
            Arc::new(MockClient {
                fixed: "Proof of stake is a consensus mechanism.".into(),
            }),
            0.85,
        )),
    }
}

fn test_router(dir: &tempfile::TempDir) -> Router {
    api::router(test_state(dir))
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_200() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir);

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn news_endpoint_returns_merged_sorted_items() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir);

    let resp = app
        .oneshot(Request::get("/api/news?lang=en").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["count"], 3);
    let data = v["data"].as_array().unwrap();
    let ts: Vec<u64> = data.iter().map(|i| i["timestamp"].as_u64().unwrap()).collect();
    let mut sorted = ts.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ts, sorted, "items must arrive newest first");
}

#[tokio::test]
async fn news_endpoint_honors_limit_and_source_filter() {
    let dir = tempfile::tempdir().unwrap();

    let app = test_router(&dir);
    let resp = app
        .oneshot(Request::get("/api/news?limit=1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["count"], 1);

    let app = test_router(&dir);
    let resp = app
        .oneshot(
            Request::get("/api/news?source=FeedB")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let v = json_body(resp).await;
    for item in v["data"].as_array().unwrap() {
        assert_eq!(item["source"], "FeedB");
    }
}

#[tokio::test]
async fn status_reports_cached_after_first_read() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    // Cold: nothing cached yet.
    let app = api::router(state.clone());
    let resp = app
        .oneshot(Request::get("/api/news/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["en"]["cached"], false);

    // A read populates the cache; status reflects it.
    state.news.merged_news(Lang::En).await;
    let app = api::router(state);
    let resp = app
        .oneshot(Request::get("/api/news/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["en"]["cached"], true);
    assert_eq!(v["en"]["count"], 3);
    assert!(v["en"]["seconds_remaining"].as_u64().unwrap() <= 300);
}

#[tokio::test]
async fn search_endpoint_filters_by_keyword() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir);

    let resp = app
        .oneshot(
            Request::get("/api/news/search?q=rollup")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["count"], 1);
    assert!(v["data"][0]["title"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("rollup"));
}

#[tokio::test]
async fn ask_endpoint_requires_a_question() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(&dir);

    let resp = app
        .oneshot(
            Request::post("/api/ai/ask")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "question": "  " }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = json_body(resp).await;
    assert_eq!(v["success"], false);
}

#[tokio::test]
async fn ask_endpoint_round_trips_and_then_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    let payload = json!({ "question": "what is proof of stake?", "lang": "en" });

    let app = api::router(state.clone());
    let resp = app
        .oneshot(
            Request::post("/api/ai/ask")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["from_cache"], false);

    let app = api::router(state);
    let resp = app
        .oneshot(
            Request::post("/api/ai/ask")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["from_cache"], true);
}

#[tokio::test]
async fn stats_and_clear_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);
    state
        .knowledge
        .ask("what is a blockchain", Lang::En)
        .await
        .unwrap();

    let app = api::router(state.clone());
    let resp = app
        .oneshot(Request::get("/api/ai/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["stats"]["total"], 1);

    let app = api::router(state.clone());
    let resp = app
        .oneshot(Request::post("/api/ai/clear").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v = json_body(resp).await;
    assert_eq!(v["cleared"], 1);
    assert_eq!(state.knowledge.knowledge_base().len(), 0);
}
