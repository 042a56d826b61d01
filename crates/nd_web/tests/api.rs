use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use nd_core::{ArticleRecord, Error, InferenceModel, NewsSource, RawArticle, Result, SortMode};
use nd_inference::models::DummyModel;
use nd_pipeline::{Pipeline, PipelineConfig};
use nd_search::SearchConfig;
use nd_storage::{ArticleCache, MemoryStore};
use nd_web::handlers::{REPORT_FAILED, SUMMARY_FAILED};
use nd_web::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct OneStory;

#[async_trait]
impl NewsSource for OneStory {
    fn name(&self) -> &str {
        "one-story"
    }

    async fn fetch_page(&self, _query: &str, _display: usize, start: usize, _sort: SortMode) -> Result<Vec<RawArticle>> {
        if start > 1 {
            return Ok(Vec::new());
        }
        Ok((0..3)
            .map(|i| RawArticle {
                title: "테슬라 로보택시 공개".to_string(),
                description: "테슬라 로보택시 공개 행사".to_string(),
                pub_date: "Mon, 14 Apr 2025 09:30:00 +0900".to_string(),
                original_link: Some(format!("https://news.example.com/{}", i)),
            })
            .collect())
    }
}

struct Unreachable;

#[async_trait]
impl InferenceModel for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn extract_keywords(&self, _articles: &[ArticleRecord]) -> Result<Vec<String>> {
        Err(Error::Inference("connection refused".to_string()))
    }

    async fn summarize_articles(&self, _articles: &[ArticleRecord]) -> Result<String> {
        Err(Error::Inference("connection refused".to_string()))
    }

    async fn generate_report(&self, _keywords: &[String], _summary: &str) -> Result<String> {
        Err(Error::Inference("connection refused".to_string()))
    }
}

async fn app(model: Arc<dyn InferenceModel>) -> Router {
    let cache = ArticleCache::new(Arc::new(MemoryStore::new()));
    let pipeline = Pipeline::new(
        Arc::new(OneStory),
        model,
        cache,
        SearchConfig::default(),
        PipelineConfig::default().with_seed(1),
    );
    create_app(AppState::new(pipeline)).await
}

async fn dummy_app() -> Router {
    app(Arc::new(DummyModel::new(None).await.unwrap())).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_search_initial_query() {
    let (status, body) = post(dummy_app().await, "/search", json!({ "query": "테슬라" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query_list"], json!(["테슬라"]));
    assert_eq!(body["is_initial"], true);
    assert_eq!(body["articles"].as_array().unwrap().len(), 2);
    assert_eq!(body["keywords"][0], "테슬라");
}

#[tokio::test]
async fn test_search_derived_query_list() {
    let request = json!({ "query_list": ["테슬라", "로보택시"], "is_initial": false });
    let (status, body) = post(dummy_app().await, "/search", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_initial"], false);
    assert_eq!(body["keywords"], json!([]));
}

#[tokio::test]
async fn test_search_without_terms_is_rejected() {
    let (status, body) = post(dummy_app().await, "/search", json!({ "query": " " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_summary_and_report() {
    let articles = json!([
        { "title": "테슬라 로보택시 공개", "description": "행사", "pubDate": "Mon, 14 Apr 2025 09:30:00 +0900" },
        { "title": "로보택시 규제 논의", "description": "정부", "pubDate": "Mon, 14 Apr 2025 10:30:00 +0900" }
    ]);
    let (status, body) = post(dummy_app().await, "/summary", json!({ "articles": articles })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "테슬라 로보택시 공개. 로보택시 규제 논의");

    let request = json!({ "keywords": ["로보택시"], "summary": "요약" });
    let (_, body) = post(dummy_app().await, "/report", request).await;
    assert_eq!(body["report"], "로보택시: 요약");
}

#[tokio::test]
async fn test_model_failures_use_fixed_texts() {
    let unreachable: Arc<dyn InferenceModel> = Arc::new(Unreachable);
    let articles = json!({ "articles": [{ "title": "제목", "description": "본문", "pubDate": "" }] });

    let (status, body) = post(app(unreachable.clone()).await, "/summary", articles.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], SUMMARY_FAILED);

    let (_, body) = post(app(unreachable.clone()).await, "/report", json!({ "keywords": [], "summary": "" })).await;
    assert_eq!(body["report"], REPORT_FAILED);

    let (_, body) = post(app(unreachable).await, "/keywords", articles).await;
    assert_eq!(body["keywords"], json!([]));
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = dummy_app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
