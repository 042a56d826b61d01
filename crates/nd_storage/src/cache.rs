//! Keyword → article-link cache.
//!
//! Two key namespaces live in the underlying [`CacheStore`]:
//!
//! - `keyword:<normalized query>` holds the set of article links a search
//!   produced.
//! - `news:<link>` holds the flattened article record.
//!
//! Both expire after [`DEFAULT_TTL`]. A link whose article hash has expired or
//! was never written is dropped during hydration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use nd_core::{normalize_key, ArticleRecord, CacheStore, Result, NOISE};
use serde::Serialize;
use tracing::{debug, info};

pub const KEYWORD_PREFIX: &str = "keyword:";
pub const NEWS_PREFIX: &str = "news:";
pub const DEFAULT_TTL: Duration = Duration::from_secs(604_800);

/// One `keyword:*` entry, as reported by [`ArticleCache::list_entries`].
#[derive(Debug, Clone, Serialize)]
pub struct CachedKeyword {
    pub key: String,
    pub links: Vec<String>,
    pub titles: Vec<Option<String>>,
}

#[derive(Clone)]
pub struct ArticleCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ArticleCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, ttl: DEFAULT_TTL }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn store_handle(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    fn keyword_key(cache_key: &str) -> String {
        format!("{}{}", KEYWORD_PREFIX, normalize_key(cache_key))
    }

    fn news_key(link: &str) -> String {
        format!("{}{}", NEWS_PREFIX, link)
    }

    /// Links previously stored for `cache_key`; empty on a miss.
    pub async fn lookup(&self, cache_key: &str) -> Result<BTreeSet<String>> {
        let links = self.store.set_members(&Self::keyword_key(cache_key)).await?;
        debug!("Cache lookup - key={}, links={}", cache_key, links.len());
        Ok(links)
    }

    /// Rebuild article records for `links`, skipping links with no stored hash.
    pub async fn hydrate(&self, links: &BTreeSet<String>) -> Result<Vec<ArticleRecord>> {
        let lookups = links.iter().map(|link| async move {
            let fields = self.store.hash_get_all(&Self::news_key(link)).await?;
            Ok::<_, nd_core::Error>((link, fields))
        });

        let mut articles = Vec::with_capacity(links.len());
        for result in join_all(lookups).await {
            let (link, fields) = result?;
            match record_from_fields(link, &fields) {
                Some(record) => articles.push(record),
                None => debug!("Stale cache link dropped - {}", link),
            }
        }
        Ok(articles)
    }

    /// Replace the link set of `cache_key` with `links` and re-arm the expiry.
    /// Callers pick which links to keep; the set is stored unchanged.
    pub async fn store(&self, cache_key: &str, links: &BTreeSet<String>) -> Result<()> {
        info!("🧹 {} links stored for {}", links.len(), cache_key);
        self.store.set_replace(&Self::keyword_key(cache_key), links, self.ttl).await
    }

    /// Persist every record that carries an http(s) link. Returns how many were written.
    pub async fn store_articles(&self, records: &[ArticleRecord]) -> Result<usize> {
        let mut written = 0;
        for record in records {
            let Some(link) = record.http_link() else {
                continue;
            };
            self.store
                .hash_replace(&Self::news_key(link), &record_to_fields(record), self.ttl)
                .await?;
            written += 1;
        }
        debug!("Cached {} of {} articles", written, records.len());
        Ok(written)
    }

    /// Every live keyword entry with its links and the cached title per link.
    pub async fn list_entries(&self) -> Result<Vec<CachedKeyword>> {
        let mut entries = Vec::new();
        for key in self.store.keys(KEYWORD_PREFIX).await? {
            let links: Vec<String> = self.store.set_members(&key).await?.into_iter().collect();
            let mut titles = Vec::with_capacity(links.len());
            for link in &links {
                let fields = self.store.hash_get_all(&Self::news_key(link)).await?;
                titles.push(fields.get("title").cloned());
            }
            entries.push(CachedKeyword { key, links, titles });
        }
        Ok(entries)
    }

    /// Delete all `keyword:*` and `news:*` keys. Returns the number removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut deleted = 0;
        for prefix in [KEYWORD_PREFIX, NEWS_PREFIX] {
            for key in self.store.keys(prefix).await? {
                if self.store.delete(&key).await? {
                    debug!("🗑 Deleted {}", key);
                    deleted += 1;
                }
            }
        }
        info!("Cache cleared - {} keys deleted", deleted);
        Ok(deleted)
    }
}

fn record_to_fields(record: &ArticleRecord) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), record.title.clone());
    fields.insert("description".to_string(), record.description.clone());
    fields.insert("pubDate".to_string(), record.raw_published_at.clone());
    fields.insert("pubDateLocal".to_string(), record.normalized_published_at.clone());
    fields.insert("originallink".to_string(), record.original_link.clone().unwrap_or_default());
    fields.insert("text".to_string(), record.composite_text.clone());
    fields.insert("processed_text".to_string(), record.processed_text.clone());
    fields.insert("cluster".to_string(), record.cluster_id.to_string());
    fields
}

fn record_from_fields(link: &str, fields: &BTreeMap<String, String>) -> Option<ArticleRecord> {
    if fields.is_empty() {
        return None;
    }
    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    Some(ArticleRecord {
        title: field("title"),
        description: field("description"),
        raw_published_at: field("pubDate"),
        normalized_published_at: field("pubDateLocal"),
        original_link: Some(link.to_string()),
        composite_text: field("text"),
        processed_text: field("processed_text"),
        cluster_id: fields.get("cluster").and_then(|c| c.parse().ok()).unwrap_or(NOISE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn article(link: &str, title: &str, cluster_id: i32) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            description: format!("{} description", title),
            raw_published_at: "Mon, 14 Apr 2025 09:30:00 +0900".to_string(),
            normalized_published_at: "2025.04.14. 오전 9:30".to_string(),
            original_link: Some(link.to_string()),
            composite_text: format!("{} {} description", title, title),
            processed_text: title.to_string(),
            cluster_id,
        }
    }

    fn cache() -> ArticleCache {
        ArticleCache::new(Arc::new(MemoryStore::new()))
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_store_then_lookup_returns_exact_links() {
        let cache = cache();
        let links = set(&["https://a/1", "https://a/2", "https://a/3"]);
        cache.store("tesla", &links).await.unwrap();
        assert_eq!(cache.lookup("tesla").await.unwrap(), links);
        // Lookups go through the same key normalization
        assert_eq!(cache.lookup("  TESLA ").await.unwrap(), links);
        assert!(cache.lookup("ford").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_keeps_the_set_unchanged() {
        let cache = cache();
        let links = set(&["https://a/1", "HTTPS://a/2", "ftp://a/3"]);
        cache.store("tesla", &links).await.unwrap();
        assert_eq!(cache.lookup("tesla").await.unwrap(), links);

        // a second store replaces rather than merges
        cache.store("tesla", &set(&["https://a/4"])).await.unwrap();
        assert_eq!(cache.lookup("tesla").await.unwrap(), set(&["https://a/4"]));
    }

    #[tokio::test]
    async fn test_hydrate_skips_stale_links() {
        let cache = cache();
        let stored = article("https://a/1", "Tesla recall", 0);
        cache.store_articles(&[stored.clone()]).await.unwrap();

        let hydrated = cache.hydrate(&set(&["https://a/1", "https://a/missing"])).await.unwrap();
        assert_eq!(hydrated, vec![stored]);
    }

    #[tokio::test]
    async fn test_store_articles_requires_http_link() {
        let cache = cache();
        let mut no_link = article("https://a/2", "No link", 1);
        no_link.original_link = None;
        let mut bad_link = article("https://a/3", "Bad link", 1);
        bad_link.original_link = Some("javascript:void(0)".to_string());

        let written = cache
            .store_articles(&[article("https://a/1", "Good", 0), no_link, bad_link])
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(cache.store_handle().keys(NEWS_PREFIX).await.unwrap(), vec!["news:https://a/1"]);
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let cache = cache();
        cache.store_articles(&[article("https://a/1", "Tesla recall", 0)]).await.unwrap();
        cache.store("tesla", &set(&["https://a/1", "https://a/2"])).await.unwrap();

        let entries = cache.list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "keyword:tesla");
        assert_eq!(entries[0].titles, vec![Some("Tesla recall".to_string()), None]);

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.list_entries().await.unwrap().is_empty());
    }
}
