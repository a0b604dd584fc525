//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod quantity;
pub mod rating;
pub mod sort;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use quantity::{Quantity, QuantityError};
pub use rating::{Rating, RatingError};
pub use sort::{SortKey, SortKeyError};
