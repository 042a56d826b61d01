use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use async_trait::async_trait;
use crate::Result;

/// String-keyed set and hash operations with expiry.
///
/// Missing or expired keys read back as empty collections.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Replace the set stored at `key` and (re)arm its expiry
    async fn set_replace(&self, key: &str, members: &BTreeSet<String>, ttl: Duration) -> Result<()>;

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>>;

    /// Replace the field map stored at `key` and (re)arm its expiry
    async fn hash_replace(&self, key: &str, fields: &BTreeMap<String, String>, ttl: Duration) -> Result<()>;

    async fn hash_get_all(&self, key: &str) -> Result<BTreeMap<String, String>>;

    /// List live keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete a key of any kind, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}
