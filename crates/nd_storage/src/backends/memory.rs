use async_trait::async_trait;
use nd_core::{CacheStore, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use crate::{BackendConfig, StorageBackend};

#[derive(Debug, Clone)]
enum Value {
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, Entry>,
}

impl MemoryInner {
    fn live(&self, key: &str) -> Option<&Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| &entry.value)
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

/// Process-local cache store. Expired keys are purged lazily on write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(_config: &BackendConfig) -> Result<Self> where Self: Sized {
        Ok(Self::default())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn set_replace(&self, key: &str, members: &BTreeSet<String>, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.purge_expired();
        inner.entries.insert(key.to_string(), Entry {
            value: Value::Set(members.clone()),
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>> {
        let inner = self.inner.read().await;
        Ok(match inner.live(key) {
            Some(Value::Set(members)) => members.clone(),
            _ => BTreeSet::new(),
        })
    }

    async fn hash_replace(&self, key: &str, fields: &BTreeMap<String, String>, ttl: Duration) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.purge_expired();
        inner.entries.insert(key.to_string(), Entry {
            value: Value::Hash(fields.clone()),
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let inner = self.inner.read().await;
        Ok(match inner.live(key) {
            Some(Value::Hash(fields)) => fields.clone(),
            _ => BTreeMap::new(),
        })
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        let mut keys: Vec<String> = inner.entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        Ok(inner.entries.remove(key).map_or(false, |entry| entry.is_live(now)))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(604_800);

    fn links(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_replace_and_members() {
        let store = MemoryStore::new();
        store.set_replace("keyword:tesla", &links(&["https://a/1", "https://a/2"]), WEEK).await.unwrap();
        store.set_replace("keyword:tesla", &links(&["https://a/3"]), WEEK).await.unwrap();

        let members = store.set_members("keyword:tesla").await.unwrap();
        assert_eq!(members, links(&["https://a/3"]));
        assert!(store.set_members("keyword:missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hash_replace_and_get() {
        let store = MemoryStore::new();
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Test Article".to_string());
        store.hash_replace("news:https://a/1", &fields, WEEK).await.unwrap();

        assert_eq!(store.hash_get_all("news:https://a/1").await.unwrap(), fields);
        // A set key read as a hash is empty, not an error
        store.set_replace("keyword:x", &links(&["https://a/1"]), WEEK).await.unwrap();
        assert!(store.hash_get_all("keyword:x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_are_invisible() {
        let store = MemoryStore::new();
        store.set_replace("keyword:old", &links(&["https://a/1"]), Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.set_members("keyword:old").await.unwrap().is_empty());
        assert!(store.keys("keyword:").await.unwrap().is_empty());
        assert!(!store.delete("keyword:old").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let store = MemoryStore::new();
        store.set_replace("keyword:b", &links(&["https://a/1"]), WEEK).await.unwrap();
        store.set_replace("keyword:a", &links(&["https://a/1"]), WEEK).await.unwrap();
        store.hash_replace("news:https://a/1", &BTreeMap::new(), WEEK).await.unwrap();

        assert_eq!(store.keys("keyword:").await.unwrap(), vec!["keyword:a", "keyword:b"]);
        assert!(store.delete("keyword:a").await.unwrap());
        assert_eq!(store.keys("keyword:").await.unwrap(), vec!["keyword:b"]);
    }
}
