//! In-memory caching layer using moka
//!
//! Caches the read-mostly catalog data: the sidebar listing and category
//! pages. Cart and order data is never cached.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::db;
use crate::error::Result;
use crate::models::{CategoryDetail, SidebarCategory};

/// Key of the single sidebar entry
const SIDEBAR_KEY: &str = "sidebar";

/// Application cache container
#[derive(Clone)]
pub struct AppCache {
    /// Sidebar categories with product counts (singleton)
    pub sidebar: Cache<String, Arc<Vec<SidebarCategory>>>,
    /// Category pages (slug -> CategoryDetail)
    pub categories: Cache<String, Arc<CategoryDetail>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Sidebar: 1 entry, 15 min TTL
            sidebar: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(15 * 60))
                .build(),

            // Category pages: 200 entries, 15 min TTL, 5 min idle
            categories: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(15 * 60))
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Sidebar listing, loaded from the database on a miss
    pub async fn sidebar(&self, db: &PgPool) -> Result<Arc<Vec<SidebarCategory>>> {
        if let Some(cached) = self.sidebar.get(SIDEBAR_KEY).await {
            tracing::debug!("Cache HIT for sidebar");
            return Ok(cached);
        }
        tracing::debug!("Cache MISS for sidebar");
        let categories = Arc::new(db::get_categories_for_sidebar(db).await?);
        self.sidebar
            .insert(SIDEBAR_KEY.to_string(), categories.clone())
            .await;
        Ok(categories)
    }

    /// Category page with all its products, loaded on a miss
    pub async fn category(&self, db: &PgPool, slug: &str) -> Result<Arc<CategoryDetail>> {
        if let Some(cached) = self.categories.get(slug).await {
            tracing::debug!("Cache HIT for category: {}", slug);
            return Ok(cached);
        }
        tracing::debug!("Cache MISS for category: {}", slug);
        let detail = Arc::new(load_category(db, slug).await?);
        self.categories.insert(slug.to_string(), detail.clone()).await;
        Ok(detail)
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            sidebar_cached: self.sidebar.entry_count() > 0,
            categories_size: self.categories.entry_count(),
        }
    }

    /// Drop all catalog entries after a catalog write
    pub fn invalidate_catalog(&self) {
        self.sidebar.invalidate_all();
        self.categories.invalidate_all();
        info!("Catalog cache invalidated");
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub sidebar_cached: bool,
    pub categories_size: u64,
}

async fn load_category(db: &PgPool, slug: &str) -> Result<CategoryDetail> {
    let category = db::get_category_by_slug(db, slug).await?;
    let products = db::get_category_products(db, category.id).await?;
    Ok(CategoryDetail::new(&category, &products))
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes it every `every`.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool, every: Duration) {
    let mut interval = interval(every);
    loop {
        // the first tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Reload the sidebar and every category page
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match db::get_categories_for_sidebar(db).await {
        Ok(sidebar) => {
            cache
                .sidebar
                .insert(SIDEBAR_KEY.to_string(), Arc::new(sidebar))
                .await;
        }
        Err(e) => warn!("Failed to warm sidebar cache: {}", e),
    }

    match db::get_categories(db).await {
        Ok(categories) => {
            for category in categories {
                match db::get_category_products(db, category.id).await {
                    Ok(products) => {
                        let detail = CategoryDetail::new(&category, &products);
                        cache
                            .categories
                            .insert(category.slug.clone(), Arc::new(detail))
                            .await;
                    }
                    Err(e) => warn!("Failed to warm category {}: {}", category.slug, e),
                }
            }
        }
        Err(e) => warn!("Failed to list categories for warm-up: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(slug: &str) -> CategoryDetail {
        CategoryDetail {
            name: "Вагонка".to_string(),
            slug: slug.to_string(),
            image_url: None,
            description: None,
            products: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_invalidate_catalog_clears_every_entry() {
        let cache = AppCache::new();
        cache
            .categories
            .insert("vagonka".to_string(), Arc::new(detail("vagonka")))
            .await;
        cache.sidebar.insert(SIDEBAR_KEY.to_string(), Arc::new(Vec::new())).await;
        assert!(cache.categories.get("vagonka").await.is_some());

        cache.invalidate_catalog();

        assert!(cache.categories.get("vagonka").await.is_none());
        assert!(cache.sidebar.get(SIDEBAR_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_stats_report_sidebar_presence() {
        let cache = AppCache::new();
        assert!(!cache.stats().sidebar_cached);
        cache.sidebar.insert(SIDEBAR_KEY.to_string(), Arc::new(Vec::new())).await;
        cache.sidebar.run_pending_tasks().await;
        assert!(cache.stats().sidebar_cached);
    }
}
