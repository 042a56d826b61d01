use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use nd_core::{ArticleRecord, SearchSession};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::AppState;

pub const SUMMARY_FAILED: &str = "요약 생성 실패";
pub const REPORT_FAILED: &str = "최종 보고 생성 실패";

/// `{query}` starts a new search; `{query_list, is_initial}` refines one.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub query_list: Option<Vec<String>>,
    pub is_initial: Option<bool>,
}

impl SearchRequest {
    pub fn into_session(self) -> Option<SearchSession> {
        let has_terms = |terms: &[String]| terms.iter().any(|t| !t.trim().is_empty());
        match (self.query_list, self.query) {
            (Some(list), _) if has_terms(&list) => {
                Some(SearchSession::new(list, self.is_initial.unwrap_or(false)))
            }
            (_, Some(query)) if !query.trim().is_empty() => {
                Some(SearchSession::new(vec![query], self.is_initial.unwrap_or(true)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArticlesRequest {
    #[serde(default)]
    pub articles: Vec<ArticleRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let Some(session) = request.into_session() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "query or query_list is required" })),
        )
            .into_response();
    };
    info!("📥 /search {:?} (initial: {})", session.keyword_list, session.is_initial);
    Json(state.pipeline.search(&session).await).into_response()
}

pub async fn keywords(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ArticlesRequest>,
) -> impl IntoResponse {
    let keywords = match state.model().extract_keywords(&request.articles).await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!("⚠️ Keyword extraction failed: {}", e);
            Vec::new()
        }
    };
    Json(KeywordsResponse { keywords })
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ArticlesRequest>,
) -> impl IntoResponse {
    let summary = match state.model().summarize_articles(&request.articles).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("⚠️ Summary failed: {}", e);
            SUMMARY_FAILED.to_string()
        }
    };
    Json(SummaryResponse { summary })
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> impl IntoResponse {
    let report = match state.model().generate_report(&request.keywords, &request.summary).await {
        Ok(report) => report,
        Err(e) => {
            warn!("⚠️ Report failed: {}", e);
            REPORT_FAILED.to_string()
        }
    };
    Json(ReportResponse { report })
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "error": e.to_string() })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> SearchRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_single_query_is_initial() {
        let session = request(json!({ "query": "테슬라" })).into_session().unwrap();
        assert_eq!(session.keyword_list, vec!["테슬라"]);
        assert!(session.is_initial);
    }

    #[test]
    fn test_query_list_defaults_to_derived() {
        let session = request(json!({ "query_list": ["테슬라", "로보택시"], "is_initial": false }))
            .into_session()
            .unwrap();
        assert_eq!(session.keyword_list, vec!["테슬라", "로보택시"]);
        assert!(!session.is_initial);

        let session = request(json!({ "query_list": ["테슬라"] })).into_session().unwrap();
        assert!(!session.is_initial);
    }

    #[test]
    fn test_blank_request_has_no_session() {
        assert!(request(json!({})).into_session().is_none());
        assert!(request(json!({ "query": "  ", "query_list": [""] })).into_session().is_none());
    }
}
