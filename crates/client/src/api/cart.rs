//! Server-side cart endpoints. Never cached.

use reqwest::Method;
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;
use vitrine_core::{ProductId, Quantity};

use super::{ApiClient, AuthMode};
use crate::error::ApiResult;
use crate::models::Cart;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a ProductId,
    quantity: Quantity,
}

#[derive(Serialize)]
struct UpdateItemBody {
    quantity: Quantity,
}

impl ApiClient {
    /// Get the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when signed out.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart"], &[]);
        self.request(Method::GET, url, None::<&()>, AuthMode::Session)
            .await
    }

    /// Add `quantity` of a product, returning the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity.get()))]
    pub async fn add_to_cart(&self, product_id: &ProductId, quantity: Quantity) -> ApiResult<Cart> {
        let body = AddItemBody {
            product_id,
            quantity,
        };
        let url = self.endpoint(&["cart"], &[]);
        self.request(Method::POST, url, Some(&body), AuthMode::Session)
            .await
    }

    /// Set the quantity of a line, returning the updated cart.
    ///
    /// Zero is not representable here; route it to
    /// [`remove_from_cart`](Self::remove_from_cart).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity.get()))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", product_id.as_str()], &[]);
        self.request(
            Method::PATCH,
            url,
            Some(&UpdateItemBody { quantity }),
            AuthMode::Session,
        )
        .await
    }

    /// Remove a line, returning the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart", product_id.as_str()], &[]);
        self.request(Method::DELETE, url, None::<&()>, AuthMode::Session)
            .await
    }

    /// Empty the cart.
    ///
    /// The response body is ignored; the result is always an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> ApiResult<Cart> {
        let url = self.endpoint(&["cart"], &[]);
        self.request::<IgnoredAny>(Method::DELETE, url, None::<&()>, AuthMode::Session)
            .await?;
        Ok(Cart::default())
    }
}
