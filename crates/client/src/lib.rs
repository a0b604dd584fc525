//! Vitrine client library.
//!
//! The access-and-session layer of the Vitrine storefront:
//! - [`ApiClient`] - typed REST operations with bearer auth and a single
//!   transparent refresh-and-retry on 401
//! - [`SessionManager`] - explicit session state with change subscriptions
//! - [`CartController`] - optimistic cart reconciled against the server
//! - [`store`] - persistence of the token pair and cached user
//!
//! # Example
//!
//! ```no_run
//! use vitrine_client::{ApiClient, ClientConfig, Credentials, SessionManager};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let session = SessionManager::new(ApiClient::new(&config)?);
//!
//! session
//!     .sign_in(&Credentials::login("ana@x.com", "secret1")?)
//!     .await?;
//! let products = session.client().list_products(None, None).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use cart::CartController;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use models::{
    AuthResponse, Cart, CartItem, CatalogFilter, Category, CategoryRef, Credentials, Product,
    ProductDetail, ProductSnapshot, RatingSummary, Review, ReviewAuthor, ReviewDraft, TokenPair,
    User,
};
pub use session::{SessionManager, SessionState, SubscriptionId};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};
pub use tokio_util::sync::CancellationToken;
