//! Cache types for catalog responses.

use std::time::Duration;

use moka::future::Cache;
use vitrine_core::ProductId;

use crate::models::{Category, Product};

const MAX_ENTRIES: u64 = 1000;

/// Cached value types.
#[derive(Debug, Clone)]
pub(crate) enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Categories(Vec<Category>),
}

/// Read-through cache for catalog reads, keyed by request path and query.
///
/// Disabled when built without a TTL; every lookup then misses.
#[derive(Clone)]
pub(crate) struct CatalogCache {
    cache: Option<Cache<String, CacheValue>>,
}

impl CatalogCache {
    pub(crate) fn new(ttl: Option<Duration>) -> Self {
        let cache = ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build()
        });
        Self { cache }
    }

    pub(crate) async fn get(&self, key: &str) -> Option<CacheValue> {
        match &self.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub(crate) async fn insert(&self, key: String, value: CacheValue) {
        if let Some(cache) = &self.cache {
            cache.insert(key, value).await;
        }
    }

    pub(crate) async fn invalidate_product(&self, id: &ProductId) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&product_key(id)).await;
        }
    }

    pub(crate) async fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }
}

pub(crate) fn product_key(id: &ProductId) -> String {
    format!("product:{id}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use vitrine_core::Price;

    use super::*;
    use crate::models::RatingSummary;

    fn product(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: "Camiseta".to_string(),
            description: None,
            price: Price::from_cents(4990),
            image_url: None,
            category: None,
            rating: RatingSummary::default(),
            sizes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = CatalogCache::new(None);
        let id = ProductId::new("p1");
        cache
            .insert(product_key(&id), CacheValue::Product(Box::new(product("p1"))))
            .await;
        assert!(cache.get(&product_key(&id)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_product() {
        let cache = CatalogCache::new(Some(Duration::from_secs(60)));
        let id = ProductId::new("p1");
        cache
            .insert(product_key(&id), CacheValue::Product(Box::new(product("p1"))))
            .await;
        assert!(matches!(
            cache.get(&product_key(&id)).await,
            Some(CacheValue::Product(p)) if p.id == id
        ));

        cache.invalidate_product(&id).await;
        assert!(cache.get(&product_key(&id)).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = CatalogCache::new(Some(Duration::from_secs(60)));
        cache
            .insert("categories".to_string(), CacheValue::Categories(Vec::new()))
            .await;
        cache.invalidate_all().await;
        assert!(cache.get("categories").await.is_none());
    }
}
