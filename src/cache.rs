use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SKU_LIST_KEY: &str = "catalog:skus";

pub fn sku_key(sku_id: Uuid) -> String {
    format!("catalog:sku:{sku_id}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-wide catalog cache with a fixed TTL.
///
/// Readers fill it on miss; every writer to catalog data must call
/// [`CatalogCache::invalidate`] for the keys it affects.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .map(|entry| (entry.expires_at > Instant::now(), entry.value.clone()))
        };
        match cached {
            Some((true, value)) => serde_json::from_value(value).ok(),
            Some((false, _)) => {
                self.entries.write().await.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, key, "catalog cache serialization failed");
                return;
            }
        };
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    pub async fn invalidate(&self, key: &str) {
        if self.entries.write().await.remove(key).is_some() {
            tracing::debug!(key, "catalog cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalidate_drops_entry() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        cache.set(SKU_LIST_KEY, &vec![1, 2, 3]).await;
        assert_eq!(cache.get::<Vec<i32>>(SKU_LIST_KEY).await, Some(vec![1, 2, 3]));

        cache.invalidate(SKU_LIST_KEY).await;
        assert_eq!(cache.get::<Vec<i32>>(SKU_LIST_KEY).await, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = CatalogCache::new(Duration::from_millis(10));
        cache.set("k", &"v").await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cache = CatalogCache::new(Duration::from_secs(60));
        let sku = Uuid::new_v4();
        cache.set(&sku_key(sku), &7).await;
        cache.set(SKU_LIST_KEY, &8).await;
        cache.invalidate(&sku_key(sku)).await;
        assert_eq!(cache.get::<i32>(SKU_LIST_KEY).await, Some(8));
    }
}
