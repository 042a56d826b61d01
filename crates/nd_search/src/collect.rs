use nd_core::{Error, NewsSource, RawArticle, Result};
use tracing::{info, warn};
use crate::client::SearchConfig;

/// Page through `source` until `max_results` items were requested, a page
/// comes back short, or a call fails.
///
/// A failure stops pagination immediately. Items already collected are kept;
/// if nothing was collected the failure is returned as [`Error::Collection`].
pub async fn collect_articles(
    source: &dyn NewsSource,
    query: &str,
    config: &SearchConfig,
) -> Result<Vec<RawArticle>> {
    let display = config.display.clamp(1, 100);
    let mut articles = Vec::new();
    let mut last_error = None;

    for start in (1..=config.max_results).step_by(display) {
        match source.fetch_page(query, display, start, config.sort).await {
            Ok(page) => {
                let short = page.len() < display;
                articles.extend(page);
                if short {
                    break;
                }
            }
            Err(e) => {
                warn!("⚠️ Collection stopped at start={} for {}: {}", start, query, e);
                last_error = Some(e);
                break;
            }
        }
    }

    if articles.is_empty() {
        return Err(match last_error {
            Some(Error::Collection(msg)) => Error::Collection(msg),
            Some(e) => Error::Collection(e.to_string()),
            None => Error::Collection(format!("no results for {}", query)),
        });
    }

    info!("📰 Collected {} items from {} for {}", articles.len(), source.name(), query);
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nd_core::SortMode;
    use std::sync::Mutex;

    struct PagedSource {
        total: usize,
        fail_at: Option<usize>,
        calls: Mutex<Vec<usize>>,
    }

    impl PagedSource {
        fn new(total: usize, fail_at: Option<usize>) -> Self {
            Self { total, fail_at, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl NewsSource for PagedSource {
        fn name(&self) -> &str {
            "paged"
        }

        async fn fetch_page(&self, _query: &str, display: usize, start: usize, _sort: SortMode) -> Result<Vec<RawArticle>> {
            self.calls.lock().unwrap().push(start);
            if self.fail_at == Some(start) {
                return Err(Error::Collection("HTTP 500".to_string()));
            }
            let end = (start - 1 + display).min(self.total);
            Ok((start..=end)
                .map(|i| RawArticle { title: format!("item {}", i), ..Default::default() })
                .collect())
        }
    }

    fn config(display: usize, max_results: usize) -> SearchConfig {
        SearchConfig { display, max_results, ..Default::default() }
    }

    #[tokio::test]
    async fn test_collects_up_to_max_results() {
        let source = PagedSource::new(1000, None);
        let articles = collect_articles(&source, "tesla", &config(100, 500)).await.unwrap();
        assert_eq!(articles.len(), 500);
        assert_eq!(*source.calls.lock().unwrap(), vec![1, 101, 201, 301, 401]);
    }

    #[tokio::test]
    async fn test_short_page_ends_pagination() {
        let source = PagedSource::new(150, None);
        let articles = collect_articles(&source, "tesla", &config(100, 500)).await.unwrap();
        assert_eq!(articles.len(), 150);
        assert_eq!(*source.calls.lock().unwrap(), vec![1, 101]);
    }

    #[tokio::test]
    async fn test_failure_aborts_but_keeps_partial_results() {
        let source = PagedSource::new(1000, Some(201));
        let articles = collect_articles(&source, "tesla", &config(100, 500)).await.unwrap();
        assert_eq!(articles.len(), 200);
        assert_eq!(*source.calls.lock().unwrap(), vec![1, 101, 201]);
    }

    #[tokio::test]
    async fn test_failure_on_first_page_is_collection_error() {
        let source = PagedSource::new(1000, Some(1));
        let result = collect_articles(&source, "tesla", &config(100, 500)).await;
        assert!(matches!(result, Err(Error::Collection(_))));
    }

    #[tokio::test]
    async fn test_empty_result_is_collection_error() {
        let source = PagedSource::new(0, None);
        let result = collect_articles(&source, "tesla", &config(100, 500)).await;
        assert!(matches!(result, Err(Error::Collection(_))));
    }
}
