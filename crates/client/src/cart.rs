//! Client-side mirror of the server cart with optimistic updates.
//!
//! Every mutation runs in two phases: the local cart changes immediately,
//! then the server is called. On success the local cart is replaced by the
//! server's answer (the server always wins). On failure the pre-mutation
//! snapshot is restored and the error returned. Mutations are serialized so
//! a rollback never discards another mutation's optimistic state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};
use vitrine_core::{Price, ProductId, Quantity};

use crate::error::{ApiError, ApiResult};
use crate::models::{Cart, CartItem, Product, ProductSnapshot};
use crate::session::{SessionManager, SessionState};

/// Optimistic cart bound to a session.
///
/// Cheap to clone; clones share the cart.
#[derive(Clone)]
pub struct CartController {
    inner: Arc<CartInner>,
}

struct CartInner {
    session: SessionManager,
    cart: Mutex<Cart>,
    /// Serializes mutations.
    mutation: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CartController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartController")
            .field("cart", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl CartController {
    /// Create an empty cart that empties itself whenever the session ends.
    #[must_use]
    pub fn new(session: SessionManager) -> Self {
        let inner = Arc::new(CartInner {
            session,
            cart: Mutex::new(Cart::default()),
            mutation: tokio::sync::Mutex::new(()),
        });

        let weak = Arc::downgrade(&inner);
        inner.session.subscribe(move |state| {
            if matches!(state, SessionState::Anonymous)
                && let Some(inner) = weak.upgrade()
            {
                *inner.lock_cart() = Cart::default();
            }
        });

        Self { inner }
    }

    /// Current local cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.inner.lock_cart().clone()
    }

    /// Number of units in the local cart, for a header badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.lock_cart().item_count()
    }

    /// Total of the local cart.
    #[must_use]
    pub fn total(&self) -> Price {
        self.inner.lock_cart().total()
    }

    /// Replace the local cart with the server's.
    ///
    /// Signed out, the cart is simply empty and no request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; the local cart is then
    /// left as it was.
    #[instrument(skip(self))]
    pub async fn load(&self) -> ApiResult<Cart> {
        if !self.inner.session.is_authenticated() {
            let empty = Cart::default();
            *self.inner.lock_cart() = empty.clone();
            return Ok(empty);
        }

        let _guard = self.inner.mutation.lock().await;
        let cart = self.inner.session.client().get_cart().await?;
        self.inner.lock_cart().clone_from(&cart);
        Ok(cart)
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::LoginRequired` when signed out, otherwise any
    /// error from the server (after rolling back).
    #[instrument(skip_all, fields(product_id = %product.id, quantity = quantity.get()))]
    pub async fn add(&self, product: &Product, quantity: Quantity) -> ApiResult<Cart> {
        let client = self.inner.session.client();
        self.mutate(
            |cart| {
                let items = cart.items_mut();
                if let Some(line) = items.iter_mut().find(|i| i.product_id == product.id) {
                    line.quantity = line.quantity.saturating_add(quantity);
                } else {
                    items.push(CartItem {
                        product_id: product.id.clone(),
                        quantity,
                        product: Some(ProductSnapshot {
                            title: product.title.clone(),
                            price: product.price,
                            image_url: product.image_url.clone(),
                        }),
                    });
                }
            },
            move || client.add_to_cart(&product.id, quantity),
        )
        .await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::LoginRequired` when signed out, otherwise any
    /// error from the server (after rolling back).
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> ApiResult<Cart> {
        match Quantity::new(quantity) {
            Ok(quantity) => self.update(product_id, quantity).await,
            Err(_) => self.remove(product_id).await,
        }
    }

    /// One more unit of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the product is not in the cart,
    /// otherwise as [`set_quantity`](Self::set_quantity).
    pub async fn increment(&self, product_id: &ProductId) -> ApiResult<Cart> {
        let current = self.line_quantity(product_id)?;
        self.update(product_id, current.increment()).await
    }

    /// One less unit of a line; the last unit removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the product is not in the cart,
    /// otherwise as [`set_quantity`](Self::set_quantity).
    pub async fn decrement(&self, product_id: &ProductId) -> ApiResult<Cart> {
        match self.line_quantity(product_id)?.decrement() {
            Some(quantity) => self.update(product_id, quantity).await,
            None => self.remove(product_id).await,
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::LoginRequired` when signed out, otherwise any
    /// error from the server (after rolling back).
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> ApiResult<Cart> {
        let client = self.inner.session.client();
        self.mutate(
            |cart| cart.items_mut().retain(|i| &i.product_id != product_id),
            move || client.remove_from_cart(product_id),
        )
        .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::LoginRequired` when signed out, otherwise any
    /// error from the server (after rolling back).
    #[instrument(skip(self))]
    pub async fn clear(&self) -> ApiResult<Cart> {
        let client = self.inner.session.client();
        self.mutate(|cart| cart.items_mut().clear(), move || client.clear_cart())
            .await
    }

    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity.get()))]
    async fn update(&self, product_id: &ProductId, quantity: Quantity) -> ApiResult<Cart> {
        let client = self.inner.session.client();
        self.mutate(
            |cart| {
                if let Some(line) = cart
                    .items_mut()
                    .iter_mut()
                    .find(|i| &i.product_id == product_id)
                {
                    line.quantity = quantity;
                }
            },
            move || client.update_cart_item(product_id, quantity),
        )
        .await
    }

    fn line_quantity(&self, product_id: &ProductId) -> ApiResult<Quantity> {
        self.inner
            .lock_cart()
            .get(product_id)
            .map(|line| line.quantity)
            .ok_or_else(|| ApiError::InvalidInput(format!("product {product_id} is not in the cart")))
    }

    /// Apply `optimistic` locally, then reconcile with `call`'s result.
    async fn mutate<F, Fut>(&self, optimistic: impl FnOnce(&mut Cart), call: F) -> ApiResult<Cart>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Cart>>,
    {
        if !self.inner.session.is_authenticated() {
            return Err(ApiError::LoginRequired);
        }

        let _guard = self.inner.mutation.lock().await;

        let snapshot = {
            let mut cart = self.inner.lock_cart();
            let snapshot = cart.clone();
            optimistic(&mut *cart);
            snapshot
        };

        match call().await {
            Ok(server) => {
                debug!(items = server.items().len(), "Cart reconciled with server");
                self.inner.lock_cart().clone_from(&server);
                Ok(server)
            }
            Err(e) => {
                warn!(error = %e, "Cart update failed, rolling back");
                // The session may have ended mid-call; its reset wins.
                *self.inner.lock_cart() = if self.inner.session.is_authenticated() {
                    snapshot
                } else {
                    Cart::default()
                };
                Err(e)
            }
        }
    }
}

impl CartInner {
    fn lock_cart(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
