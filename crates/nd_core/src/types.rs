use serde::{Deserialize, Serialize};
use url::Url;

/// Cluster label for items DBSCAN could not place in any cluster.
pub const NOISE: i32 = -1;

/// One item as returned by the search provider, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
    #[serde(rename = "originallink", default)]
    pub original_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub description: String,
    #[serde(rename = "pubDate")]
    pub raw_published_at: String,
    #[serde(rename = "pubDateLocal", default)]
    pub normalized_published_at: String,
    #[serde(rename = "originallink", default)]
    pub original_link: Option<String>,
    #[serde(rename = "text", default)]
    pub composite_text: String,
    #[serde(default)]
    pub processed_text: String,
    #[serde(rename = "cluster", default = "noise")]
    pub cluster_id: i32,
}

fn noise() -> i32 {
    NOISE
}

impl ArticleRecord {
    /// The original link, if it is an absolute http(s) URL.
    pub fn http_link(&self) -> Option<&str> {
        let link = self.original_link.as_deref()?;
        match Url::parse(link) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(link),
            _ => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        self.cluster_id == NOISE
    }
}

/// One point of the DBSCAN parameter grid and how well it clustered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterCandidate {
    pub eps: f64,
    pub min_points: usize,
    pub cluster_count: usize,
    pub quality_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSession {
    pub keyword_list: Vec<String>,
    pub is_initial: bool,
}

impl SearchSession {
    pub fn new(keyword_list: Vec<String>, is_initial: bool) -> Self {
        Self { keyword_list, is_initial }
    }

    pub fn initial(query: impl Into<String>) -> Self {
        Self::new(vec![query.into()], true)
    }

    pub fn derived(keyword_list: Vec<String>) -> Self {
        Self::new(keyword_list, false)
    }

    /// Query string sent to the search provider.
    pub fn query(&self) -> String {
        self.keyword_list
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalized keyword combination used as the cache key.
    pub fn cache_key(&self) -> String {
        normalize_key(&self.query())
    }
}

/// Lowercases and collapses whitespace runs to a single space.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub query_list: Vec<String>,
    pub is_initial: bool,
    pub articles: Vec<ArticleRecord>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
