//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vitrine_core::{Rating, ReviewId};

/// A review on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: ReviewId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: Option<String>,
    /// Author, when the backend populated it.
    #[serde(default)]
    pub user: Option<ReviewAuthor>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Author name, or "Anonymous" when not populated.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.user.as_ref().map_or("Anonymous", |u| u.name.as_str())
    }
}

/// Populated review author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub name: String,
}

/// Body of `POST /reviews/{productId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDraft {
    rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl ReviewDraft {
    /// Build a draft. A blank comment is treated as no comment.
    #[must_use]
    pub fn new(rating: Rating, comment: Option<String>) -> Self {
        let comment = comment
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());
        Self { rating, comment }
    }

    #[must_use]
    pub const fn rating(&self) -> Rating {
        self.rating
    }

    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}
