//! Catalog models: products, categories, listing filters.

use serde::{Deserialize, Serialize};
use vitrine_core::{CategoryId, Price, ProductId, SortKey};

use super::Review;

/// A product as listed in the catalog. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Server-side product id.
    #[serde(alias = "_id")]
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price.
    pub price: Price,
    /// Product image location.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Owning category, populated or as a bare id.
    #[serde(default)]
    pub category: Option<CategoryRef>,
    /// Aggregate review rating.
    #[serde(default)]
    pub rating: RatingSummary,
    /// Available sizes, if the product comes in sizes.
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Aggregate of all reviews for a product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Mean rating, 0 when there are no reviews.
    #[serde(default)]
    pub avg: f64,
    /// Number of reviews.
    #[serde(default)]
    pub total: u32,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Server-side category id.
    #[serde(alias = "_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// A product's category field: the backend sends either the populated
/// category or just its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    /// Populated category document.
    Embedded(Category),
    /// Bare category id.
    Id(CategoryId),
}

impl CategoryRef {
    /// The referenced category's id.
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Embedded(category) => &category.id,
            Self::Id(id) => id,
        }
    }

    /// The category name, when the backend populated it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Embedded(category) => Some(&category.name),
            Self::Id(_) => None,
        }
    }
}

/// `/categories` answers with either a bare array or `{ "items": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CategoryList {
    Wrapped { items: Vec<Category> },
    Bare(Vec<Category>),
}

impl From<CategoryList> for Vec<Category> {
    fn from(list: CategoryList) -> Self {
        match list {
            CategoryList::Wrapped { items } | CategoryList::Bare(items) => items,
        }
    }
}

/// A product together with its reviews, fetched concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// Which listing endpoint to browse and how to order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFilter {
    /// `GET /products`, optionally searched.
    All {
        /// Free-text search; blank values are not sent.
        search: Option<String>,
        /// Ordering; `None` keeps the server default.
        sort: Option<SortKey>,
    },
    /// `GET /products/category/{id}`.
    Category {
        /// Category to list.
        id: CategoryId,
        /// Ordering; `None` keeps the server default.
        sort: Option<SortKey>,
    },
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self::All {
            search: None,
            sort: None,
        }
    }
}

impl CatalogFilter {
    /// The sort applied by this filter.
    #[must_use]
    pub const fn sort(&self) -> Option<SortKey> {
        match self {
            Self::All { sort, .. } | Self::Category { sort, .. } => *sort,
        }
    }

    /// The trimmed search term, if there is one worth sending.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        match self {
            Self::All {
                search: Some(term), ..
            } => Some(term.trim()).filter(|t| !t.is_empty()),
            _ => None,
        }
    }
}
