use std::collections::BTreeSet;
use std::sync::Arc;

use nd_core::{
    normalize_key, ArticleRecord, Error, InferenceModel, NewsSource, PipelineResponse, Result,
    SearchSession,
};
use nd_search::{collect_articles, SearchConfig};
use nd_storage::ArticleCache;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::process::process_batch;

pub const MAX_KEYWORDS: usize = 3;

pub const RETRY_MESSAGE: &str = "뉴스를 가져오지 못했습니다. 잠시 후 다시 시도해주세요.";
pub const KEYWORD_QUERY_MESSAGE: &str =
    "검색 중 문제가 발생했습니다. 문장 대신 핵심 키워드 위주로 검색해주세요.";

/// Query first, then the extracted keywords not already present, capped at
/// [`MAX_KEYWORDS`].
pub fn compose_keywords(query: &str, extracted: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut keywords = Vec::with_capacity(MAX_KEYWORDS);
    for keyword in std::iter::once(query.trim().to_string()).chain(extracted) {
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() || !seen.insert(normalize_key(&keyword)) {
            continue;
        }
        keywords.push(keyword);
    }
    keywords
}

/// Runs one search session end to end: cache check, collection,
/// deduplication, keyword extraction and cache write.
///
/// Concurrent sessions for the same key may both miss and both write; the
/// last write wins.
pub struct Pipeline {
    source: Arc<dyn NewsSource>,
    model: Arc<dyn InferenceModel>,
    cache: ArticleCache,
    search: SearchConfig,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn NewsSource>,
        model: Arc<dyn InferenceModel>,
        cache: ArticleCache,
        search: SearchConfig,
        config: PipelineConfig,
    ) -> Self {
        let cache = cache.with_ttl(config.cache_ttl);
        Self { source, model, cache, search, config }
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    pub fn model(&self) -> &Arc<dyn InferenceModel> {
        &self.model
    }

    /// Never fails: errors are folded into the response with a hint for the
    /// user.
    pub async fn search(&self, session: &SearchSession) -> PipelineResponse {
        match self.run(session).await {
            Ok(response) => response,
            Err(Error::Collection(msg)) => {
                warn!("⚠️ Collection failed for {:?}: {}", session.query(), msg);
                PipelineResponse {
                    query_list: session.keyword_list.clone(),
                    is_initial: session.is_initial,
                    message: Some(RETRY_MESSAGE.to_string()),
                    ..Default::default()
                }
            }
            Err(e) => {
                error!("❌ Search failed for {:?}: {}", session.query(), e);
                PipelineResponse {
                    query_list: session.keyword_list.clone(),
                    is_initial: session.is_initial,
                    keywords: session
                        .keyword_list
                        .iter()
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect(),
                    message: Some(KEYWORD_QUERY_MESSAGE.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    async fn run(&self, session: &SearchSession) -> Result<PipelineResponse> {
        let query = session.query();
        if query.is_empty() {
            return Err(Error::Collection("empty query".to_string()));
        }
        let key = session.cache_key();
        info!("🔎 Search {:?} (initial: {})", query, session.is_initial);

        if let Some(articles) = self.cached(&key).await {
            info!("⚡ Cache hit for {:?} - {} articles", key, articles.len());
            let keywords = if session.is_initial {
                self.keywords_for(&query, &articles).await
            } else {
                Vec::new()
            };
            return Ok(self.respond(session, articles, keywords));
        }

        let raw = collect_articles(self.source.as_ref(), &query, &self.search).await?;
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || process_batch(&raw, &config))
            .await
            .map_err(|e| Error::External(e.into()))??;
        let articles = outcome.deduplicated.articles;

        if !session.is_initial {
            return Ok(self.respond(session, articles, Vec::new()));
        }

        let keywords = self.keywords_for(&query, &articles).await;
        self.persist(&key, &articles).await;
        Ok(self.respond(session, articles, keywords))
    }

    /// Hydrated articles for `key`, or `None` on a miss. Lookup errors and
    /// fully stale entries count as misses.
    async fn cached(&self, key: &str) -> Option<Vec<ArticleRecord>> {
        let links = match self.cache.lookup(key).await {
            Ok(links) => links,
            Err(e) => {
                warn!("⚠️ Cache lookup failed for {:?}: {}", key, e);
                return None;
            }
        };
        if links.is_empty() {
            return None;
        }
        match self.cache.hydrate(&links).await {
            Ok(articles) if !articles.is_empty() => Some(articles),
            Ok(_) => {
                info!("🗑️ Every cached link for {:?} was stale", key);
                None
            }
            Err(e) => {
                warn!("⚠️ Cache hydration failed for {:?}: {}", key, e);
                None
            }
        }
    }

    async fn keywords_for(&self, query: &str, articles: &[ArticleRecord]) -> Vec<String> {
        if articles.is_empty() {
            return compose_keywords(query, Vec::new());
        }
        let extracted = match self.model.extract_keywords(articles).await {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!("⚠️ Keyword extraction with {} failed: {}", self.model.name(), e);
                Vec::new()
            }
        };
        compose_keywords(query, extracted)
    }

    async fn persist(&self, key: &str, articles: &[ArticleRecord]) {
        let links: BTreeSet<String> = articles
            .iter()
            .filter_map(|a| a.http_link())
            .map(str::to_string)
            .collect();
        if links.is_empty() {
            return;
        }
        let result = async {
            let stored = self.cache.store_articles(articles).await?;
            self.cache.store(key, &links).await?;
            Ok::<_, Error>(stored)
        }
        .await;
        match result {
            Ok(stored) => info!("💾 Cached {} articles under {:?}", stored, key),
            Err(e) => error!("❌ Cache write failed for {:?}: {}", key, e),
        }
    }

    fn respond(
        &self,
        session: &SearchSession,
        articles: Vec<ArticleRecord>,
        keywords: Vec<String>,
    ) -> PipelineResponse {
        PipelineResponse {
            query_list: session.keyword_list.clone(),
            is_initial: session.is_initial,
            articles,
            keywords,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compose_puts_query_first() {
        let keywords = compose_keywords("테슬라", strings(&["자율주행", "로보택시", "규제"]));
        assert_eq!(keywords, strings(&["테슬라", "자율주행", "로보택시"]));
    }

    #[test]
    fn test_compose_drops_duplicates_of_query() {
        let keywords = compose_keywords("Tesla", strings(&["tesla", "로보택시", "로보택시", " "]));
        assert_eq!(keywords, strings(&["Tesla", "로보택시"]));
    }

    #[test]
    fn test_compose_without_extraction() {
        assert_eq!(compose_keywords("전기차", Vec::new()), strings(&["전기차"]));
    }
}
