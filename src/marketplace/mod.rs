//! Marketplace data access
//!
//! The scoring and catalog core never talks to storage. Whatever backs the
//! marketplace implements [`MarketplaceSource`] and the API layer fetches
//! through it before handing plain slices to the core.

use async_trait::async_trait;
use tracing::instrument;

use crate::catalog::{Favorite, Professional, ServiceListing};
use crate::error::Result;
use crate::recommendation::Transaction;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryMarketplace;
pub use postgres::PgMarketplace;

/// Read access to the marketplace
#[async_trait]
pub trait MarketplaceSource: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Cheap reachability check for the health endpoint
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// The user's completed bookings, most recent first, at most `limit`
    async fn fetch_history(&self, user_id: &str, limit: usize) -> Result<Vec<Transaction>>;

    async fn fetch_professionals(&self) -> Result<Vec<Professional>>;

    /// Active listings only
    async fn fetch_listings(&self) -> Result<Vec<ServiceListing>>;

    async fn fetch_favorites(&self, user_id: &str) -> Result<Vec<Favorite>>;
}

/// Everything the catalog processor needs for one user
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub professionals: Vec<Professional>,
    pub listings: Vec<ServiceListing>,
    pub favorites: Vec<Favorite>,
}

/// Fetch professionals, listings and favourites concurrently
#[instrument(skip(source), fields(source = source.name()))]
pub async fn load_catalog(source: &dyn MarketplaceSource, user_id: &str) -> Result<CatalogSnapshot> {
    let (professionals, listings, favorites) = tokio::try_join!(
        source.fetch_professionals(),
        source.fetch_listings(),
        source.fetch_favorites(user_id),
    )?;

    Ok(CatalogSnapshot {
        professionals,
        listings,
        favorites,
    })
}
