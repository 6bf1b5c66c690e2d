//! ToFit library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod api;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod marketplace;
pub mod recommendation;

// Re-export commonly used types
pub use catalog::{CatalogEntity, CatalogFilters, CatalogProcessor, SortStrategy};
pub use config::Config;
pub use database::Database;
pub use error::{Error, Result};
pub use marketplace::MarketplaceSource;
pub use recommendation::{
    RecommendationEngine, Recommendations, ScoredItem, Transaction, UserAnalysis,
};
