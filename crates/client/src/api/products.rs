//! Catalog reads: products and categories.
//!
//! Responses are cached per request path for the configured TTL.

use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;
use vitrine_core::{CategoryId, ProductId, SortKey};

use super::cache::{CacheValue, product_key};
use super::{ApiClient, AuthMode};
use crate::error::ApiResult;
use crate::models::{CatalogFilter, Category, CategoryList, Product, ProductDetail};

impl ApiClient {
    /// List products, optionally filtered by search text and sorted.
    ///
    /// Blank search text is not sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        search: Option<&str>,
        sort: Option<SortKey>,
    ) -> ApiResult<Vec<Product>> {
        let mut query = Vec::new();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            query.push(("search", term));
        }
        if let Some(sort) = sort {
            query.push(("sort", sort.as_str()));
        }

        let url = self.endpoint(&["products"], &query);
        self.cached_products(url).await
    }

    /// List the products of one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(category_id = %id))]
    pub async fn list_products_by_category(
        &self,
        id: &CategoryId,
        sort: Option<SortKey>,
    ) -> ApiResult<Vec<Product>> {
        let query: Vec<(&str, &str)> = sort.map(|s| ("sort", s.as_str())).into_iter().collect();
        let url = self.endpoint(&["products", "category", id.as_str()], &query);
        self.cached_products(url).await
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` (404) if the product does not exist.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> ApiResult<Product> {
        let cache_key = product_key(id);

        if let Some(CacheValue::Product(product)) = self.catalog().get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()], &[]);
        let product: Product = self
            .request(Method::GET, url, None::<&()>, AuthMode::Session)
            .await?;

        self.catalog()
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.catalog().get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["categories"], &[]);
        let categories: Vec<Category> = self
            .request::<CategoryList>(Method::GET, url, None::<&()>, AuthMode::Session)
            .await?
            .into();

        self.catalog()
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// List products through a [`CatalogFilter`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn browse(&self, filter: &CatalogFilter) -> ApiResult<Vec<Product>> {
        match filter {
            CatalogFilter::All { sort, .. } => {
                self.list_products(filter.search_term(), *sort).await
            }
            CatalogFilter::Category { id, sort } => {
                self.list_products_by_category(id, *sort).await
            }
        }
    }

    /// Fetch a product and its reviews concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error from either request.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn product_detail(&self, id: &ProductId) -> ApiResult<ProductDetail> {
        let (product, reviews) = tokio::try_join!(self.get_product(id), self.list_reviews(id))?;
        Ok(ProductDetail { product, reviews })
    }

    async fn cached_products(&self, url: Url) -> ApiResult<Vec<Product>> {
        let cache_key = match url.query() {
            Some(query) => format!("products:{}?{query}", url.path()),
            None => format!("products:{}", url.path()),
        };

        if let Some(CacheValue::Products(products)) = self.catalog().get(&cache_key).await {
            debug!(key = %cache_key, "Cache hit for product list");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .request(Method::GET, url, None::<&()>, AuthMode::Session)
            .await?;

        self.catalog()
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }
}
