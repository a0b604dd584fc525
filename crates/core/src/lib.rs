//! Vitrine Core - Shared domain types.
//!
//! This crate provides the value types used across all Vitrine components:
//! - `client` - API access layer, session manager and cart controller
//! - `cli` - Terminal storefront built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and their validation rules - no I/O,
//! no HTTP clients, no persistence. Anything that can be rejected before a
//! request leaves the process (a rating of 6, a quantity of 0, a malformed
//! email) is rejected here.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, quantities,
//!   ratings and catalog sort keys

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
