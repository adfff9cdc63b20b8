//! Infrastructure layer: configuration, record stores and application
//! services.

pub mod config;
pub mod service;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, StorefrontConfig, bootstrap, build_config, load_config};
pub use service::{CatalogFacets, CatalogService, OrderService, ServiceError, VariantView};
pub use store::{InMemoryOrderStore, InMemoryProductStore, OrderStore, ProductStore, StoreError};
