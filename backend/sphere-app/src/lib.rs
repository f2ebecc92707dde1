//! SocialSphere composition root
//!
//! - `config`: environment configuration for every component
//! - `logging`: tracing subscriber setup
//! - `context`: backend injection and the shared [`AppContext`]
//! - `navigation`: which screen to open on start

pub mod config;
pub mod context;
pub mod logging;
pub mod navigation;

pub use config::Config;
pub use context::{AppContext, Backends, InMemoryBackends};
pub use navigation::{initial_route, Route};

use prometheus::Registry;

/// Registry holding the store and social metrics
pub fn metrics_registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    document_store::StoreMetrics::register(&registry)?;
    social_service::metrics::register(&registry)?;
    Ok(registry)
}
