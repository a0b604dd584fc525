//! Wire models for the storefront REST API.
//!
//! The backend speaks camelCase JSON and identifies documents by `_id`; the
//! models accept both `_id` and `id`. Unknown fields are ignored so backend
//! additions never break the client.

mod auth;
mod cart;
mod catalog;
mod review;

pub use auth::{AuthResponse, Credentials, TokenPair, User};
pub use cart::{Cart, CartItem, ProductSnapshot};
pub use catalog::{CatalogFilter, Category, CategoryRef, Product, ProductDetail, RatingSummary};
pub use review::{Review, ReviewAuthor, ReviewDraft};

pub(crate) use catalog::CategoryList;
