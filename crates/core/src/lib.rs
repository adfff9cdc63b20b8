//! `storefront-core`: shared domain building blocks.
//!
//! Identifiers and the domain error model used by the catalog, sales and
//! infrastructure crates. No IO.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{BatchId, OrderId, ProductId, UserId};
