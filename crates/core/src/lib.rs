//! ArtVaani Core - Shared types library.
//!
//! This crate provides common types used across all ArtVaani components:
//! - `market` - Marketplace application library (cart, checkout, reviews)
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and status enums
//! - [`domain`] - Marketplace document types (profiles, products, orders)
//! - [`error`] - The application-wide error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod domain;
pub mod error;
pub mod types;

pub use domain::*;
pub use error::{MarketError, MarketResult};
pub use types::*;
