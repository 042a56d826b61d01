use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use nd_core::{Error, NewsSource, RawArticle, Result, SortMode};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/v1/search/news.json";

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Items per page; the provider caps this at 100
    pub display: usize,
    pub max_results: usize,
    pub sort: SortMode,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            display: 100,
            max_results: 500,
            sort: SortMode::Sim,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<RawArticle>,
}

pub struct NaverNewsClient {
    client: Client,
    config: SearchConfig,
}

impl fmt::Debug for NaverNewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverNewsClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.config.base_url)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl NaverNewsClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(Error::Config("Naver client id and secret are required".to_string()));
        }
        Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl NewsSource for NaverNewsClient {
    fn name(&self) -> &str {
        "Naver News"
    }

    async fn fetch_page(
        &self,
        query: &str,
        page_size: usize,
        start: usize,
        sort: SortMode,
    ) -> Result<Vec<RawArticle>> {
        debug!("Fetching page - query={}, start={}, display={}", query, start, page_size);

        let response = self.client
            .get(&self.config.base_url)
            .header("X-Naver-Client-Id", &self.config.client_id)
            .header("X-Naver-Client-Secret", &self.config.client_secret)
            .query(&[
                ("query", query.to_string()),
                ("display", page_size.to_string()),
                ("start", start.to_string()),
                ("sort", sort.as_str().to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Collection(format!("search returned {} at start={}", status, start)));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.items)
    }
}
