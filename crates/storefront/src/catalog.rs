//! Cached catalog reads.
//!
//! Published products, the category tree and labels are read together by
//! almost every catalog request, so each is cached as a whole in `moka`.
//! Admin writes become visible once the entry expires (the TTL comes from
//! `CATALOG_CACHE_TTL_SECS`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use sqlx::PgPool;

use apogee_core::ProductId;
use apogee_core::catalog::{CategoryTree, Product};
use apogee_core::content::ProductLabel;

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::ProductView;

/// Cache key for catalog data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Categories,
    Labels,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Categories(Arc<CategoryTree>),
    Labels(Arc<Vec<ProductLabel>>),
}

/// Read-through cache over [`CatalogRepository`].
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner { pool, cache }),
        }
    }

    fn repository(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.inner.pool)
    }

    /// All published products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the products cannot be loaded.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await {
            return Ok(products);
        }

        let products = Arc::new(self.repository().published_products().await?);
        tracing::debug!(count = products.len(), "Loaded published products");
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// A published product by id.
    ///
    /// Falls through to the database when the cached list does not have it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the products cannot be loaded.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.products().await?.iter().find(|p| p.id == id) {
            return Ok(Some(product.clone()));
        }
        self.repository().published_product(id).await
    }

    /// A published product as stored right now, bypassing the cache.
    ///
    /// Used where the price is captured, so an edit or unpublish in the
    /// admin applies immediately.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the product cannot be loaded.
    pub async fn current_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.repository().published_product(id).await
    }

    /// The category tree.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored categories do
    /// not form a tree.
    pub async fn category_tree(&self) -> Result<Arc<CategoryTree>, RepositoryError> {
        if let Some(CacheValue::Categories(tree)) = self.inner.cache.get(&CacheKey::Categories).await {
            return Ok(tree);
        }

        let nodes = self.repository().categories().await?;
        let tree = CategoryTree::from_nodes(nodes)
            .map_err(|e| RepositoryError::DataCorruption(format!("category tree: {e}")))?;
        let tree = Arc::new(tree);
        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(Arc::clone(&tree)))
            .await;
        Ok(tree)
    }

    /// All product labels in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the labels cannot be loaded.
    pub async fn labels(&self) -> Result<Arc<Vec<ProductLabel>>, RepositoryError> {
        if let Some(CacheValue::Labels(labels)) = self.inner.cache.get(&CacheKey::Labels).await {
            return Ok(labels);
        }

        let labels = Arc::new(self.repository().labels().await?);
        self.inner
            .cache
            .insert(CacheKey::Labels, CacheValue::Labels(Arc::clone(&labels)))
            .await;
        Ok(labels)
    }

    /// Build the public view of `products` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the tree or labels cannot be loaded.
    pub async fn views(
        &self,
        products: impl IntoIterator<Item = &Product>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let tree = self.category_tree().await?;
        let labels = self.labels().await?;
        let labels_by_id: HashMap<_, _> = labels.iter().map(|l| (l.id, l)).collect();

        Ok(products
            .into_iter()
            .map(|product| {
                let category_path = product
                    .category_id
                    .and_then(|id| tree.path(id).ok())
                    .unwrap_or_default();
                let labels = product
                    .label_ids
                    .iter()
                    .filter_map(|id| labels_by_id.get(id).map(|l| (*l).clone()))
                    .collect();
                ProductView::new(product.clone(), category_path, labels, now)
            })
            .collect())
    }
}
