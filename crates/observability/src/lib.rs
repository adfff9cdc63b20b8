//! Tracing and logging setup shared by storefront binaries and tests.

/// Subscriber configuration and initialization.
pub mod logging;

pub use logging::{LogConfig, init};
