//! Catalog Module
//!
//! Turns raw professionals, listings and favourites into display-ready
//! entities, then narrows and orders them for browsing.
//!
//! 1. **Processor** - join listings with professionals, apply defaults, mark favourites
//! 2. **Filter** - search, category, location, price, rating and verified filters
//! 3. **Sort** - named orderings, `rating` by default

pub mod filter;
pub mod model;
pub mod processor;
pub mod sort;

pub use filter::{filter_catalog, CatalogFilters};
pub use model::{
    CatalogEntity, Favorite, ListingLocation, Professional, ProfessionalSummary, ServiceListing,
    ServiceLocation,
};
pub use processor::CatalogProcessor;
pub use sort::{sort_catalog, sort_catalog_by_name, SortStrategy};

/// Filter then sort an already processed catalog
pub fn browse(
    entities: Vec<CatalogEntity>,
    filters: &CatalogFilters,
    strategy: SortStrategy,
) -> Vec<CatalogEntity> {
    let mut kept = filter_catalog(entities, filters);
    sort_catalog(&mut kept, strategy);
    kept
}
