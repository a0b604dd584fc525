//! Product reviews.

use reqwest::Method;
use serde::de::IgnoredAny;
use tracing::instrument;
use vitrine_core::ProductId;

use super::{ApiClient, AuthMode};
use crate::error::ApiResult;
use crate::models::{Product, Review, ReviewDraft};

impl ApiClient {
    /// List the reviews of a product. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn list_reviews(&self, product_id: &ProductId) -> ApiResult<Vec<Review>> {
        let url = self.endpoint(&["reviews", product_id.as_str()], &[]);
        self.request(Method::GET, url, None::<&()>, AuthMode::Session)
            .await
    }

    /// Submit (or replace) the signed-in user's review.
    ///
    /// The rating was range-checked when the draft was built, so an
    /// out-of-range rating never reaches the network. Returns the product
    /// with its updated aggregate rating.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the server's message if the
    /// review is rejected.
    #[instrument(skip_all, fields(product_id = %product_id, rating = draft.rating().get()))]
    pub async fn submit_review(
        &self,
        product_id: &ProductId,
        draft: &ReviewDraft,
    ) -> ApiResult<Product> {
        let url = self.endpoint(&["reviews", product_id.as_str()], &[]);
        let product = self
            .request(Method::POST, url, Some(draft), AuthMode::Session)
            .await;
        self.catalog().invalidate_product(product_id).await;
        product
    }

    /// Delete the signed-in user's review of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn delete_review(&self, product_id: &ProductId) -> ApiResult<()> {
        let url = self.endpoint(&["reviews", product_id.as_str()], &[]);
        let result = self
            .request::<IgnoredAny>(Method::DELETE, url, None::<&()>, AuthMode::Session)
            .await;
        self.catalog().invalidate_product(product_id).await;
        result.map(|_| ())
    }
}
