//! Catalog join
//!
//! Merges listings with their professionals. For display every missing field
//! takes a default and the user's favourites are marked; for scoring missing
//! fields stay missing. Either way, listings whose professional is unknown are
//! dropped and reported.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::model::{
    CatalogEntity, Favorite, ListingLocation, Professional, ProfessionalSummary, ServiceListing,
    ServiceLocation, DEFAULT_CATEGORY, DEFAULT_CITY, DEFAULT_DURATION_MINUTES,
};
use crate::recommendation::diagnostics::{tracing_sink, Diagnostic, DiagnosticSink};
use crate::recommendation::scoring::{CandidateItem, ItemLocation, ItemProfessional};

#[derive(Clone)]
pub struct CatalogProcessor {
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for CatalogProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogProcessor {
    pub fn new() -> Self {
        Self {
            sink: tracing_sink(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Join `listings` with `professionals`, keeping listing order.
    ///
    /// When several professionals share an id the first one is used.
    pub fn process(
        &self,
        professionals: &[Professional],
        listings: &[ServiceListing],
        favorites: &[Favorite],
    ) -> Vec<CatalogEntity> {
        let favorite_ids: HashSet<&str> = favorites.iter().map(|f| f.item_id.as_str()).collect();

        self.join(professionals, listings, |listing, professional| {
            merge(
                listing,
                professional,
                favorite_ids.contains(listing.id.as_str()),
            )
        })
    }

    /// Join `listings` with `professionals` for scoring.
    ///
    /// Same join and drop rules as [`CatalogProcessor::process`], but no
    /// display defaults: a field the listing lacks stays absent on the
    /// candidate so it contributes nothing to the score.
    pub fn candidates(
        &self,
        professionals: &[Professional],
        listings: &[ServiceListing],
    ) -> Vec<CandidateItem> {
        self.join(professionals, listings, candidate)
    }

    fn join<T>(
        &self,
        professionals: &[Professional],
        listings: &[ServiceListing],
        mut build: impl FnMut(&ServiceListing, &Professional) -> T,
    ) -> Vec<T> {
        let mut by_id: HashMap<&str, &Professional> = HashMap::with_capacity(professionals.len());
        for professional in professionals {
            by_id.entry(professional.id.as_str()).or_insert(professional);
        }

        let mut dropped = 0u64;
        let joined: Vec<T> = listings
            .iter()
            .filter_map(|listing| {
                let Some(&professional) = by_id.get(listing.professional_id.as_str()) else {
                    dropped += 1;
                    self.sink.report(Diagnostic::DanglingProfessional {
                        item_id: listing.id.clone(),
                        professional_id: listing.professional_id.clone(),
                    });
                    return None;
                };
                Some(build(listing, professional))
            })
            .collect();

        if dropped > 0 {
            ::metrics::counter!("tofit_catalog_dropped_items_total").increment(dropped);
        }
        tracing::debug!(
            listings = listings.len(),
            kept = joined.len(),
            dropped,
            "Catalog joined"
        );

        joined
    }
}

fn merge(listing: &ServiceListing, professional: &Professional, is_favorite: bool) -> CatalogEntity {
    CatalogEntity {
        id: listing.id.clone(),
        title: listing.title.clone().unwrap_or_default(),
        description: listing.description.clone().unwrap_or_default(),
        category: listing
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        price: finite_or_zero(listing.price),
        rating: finite_or_zero(listing.rating),
        review_count: listing.review_count.unwrap_or(0),
        total_bookings: listing.total_bookings.unwrap_or(0),
        location: listing
            .location
            .as_ref()
            .map(resolve_location)
            .unwrap_or_default(),
        payment_methods: listing.payment_methods.clone().unwrap_or_default(),
        images: listing.images.clone().unwrap_or_default(),
        duration_minutes: listing.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        created_at: listing.created_at,
        professional: ProfessionalSummary {
            id: professional.id.clone(),
            name: professional.name.clone().unwrap_or_default(),
            avatar_url: professional.avatar_url.clone(),
            verified: professional.verified.unwrap_or(false),
        },
        is_favorite,
    }
}

fn resolve_location(location: &ListingLocation) -> ServiceLocation {
    ServiceLocation {
        city: location
            .city
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CITY.to_string()),
        neighborhoods: location.neighborhoods.clone().unwrap_or_default(),
    }
}

fn candidate(listing: &ServiceListing, professional: &Professional) -> CandidateItem {
    CandidateItem {
        id: listing.id.clone(),
        title: listing.title.clone(),
        rating: finite(listing.rating),
        review_count: listing.review_count,
        category: listing.category.clone().filter(|c| !c.is_empty()),
        price: finite(listing.price),
        location: listing.location.as_ref().map(|location| ItemLocation {
            city: location.city.clone().filter(|c| !c.is_empty()),
        }),
        professional: Some(ItemProfessional {
            id: Some(professional.id.clone()),
            name: professional.name.clone(),
            verified: professional.verified,
        }),
        total_bookings: listing.total_bookings,
    }
}

// NaN and infinities count as missing
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    finite(value).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::diagnostics::RecordingSink;

    fn professional(id: &str, name: &str) -> Professional {
        Professional {
            id: id.to_string(),
            name: Some(name.to_string()),
            avatar_url: None,
            verified: Some(true),
        }
    }

    fn listing(id: &str, professional_id: &str) -> ServiceListing {
        ServiceListing {
            id: id.to_string(),
            professional_id: professional_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_are_substituted() {
        let processor = CatalogProcessor::new();
        let out = processor.process(&[professional("p1", "Ana")], &[listing("s1", "p1")], &[]);

        assert_eq!(out.len(), 1);
        let entity = &out[0];
        assert_eq!(entity.title, "");
        assert_eq!(entity.category, "general");
        assert_eq!(entity.price, 0.0);
        assert_eq!(entity.rating, 0.0);
        assert_eq!(entity.review_count, 0);
        assert_eq!(entity.location.city, "Buenos Aires");
        assert!(entity.location.neighborhoods.is_empty());
        assert!(entity.payment_methods.is_empty());
        assert_eq!(entity.duration_minutes, 60);
        assert_eq!(entity.professional.name, "Ana");
        assert!(entity.professional.verified);
        assert!(!entity.is_favorite);
    }

    #[test]
    fn test_dangling_professional_is_dropped_and_reported() {
        let sink = RecordingSink::new();
        let processor = CatalogProcessor::new().with_sink(Arc::new(sink.clone()));

        let out = processor.process(
            &[professional("p1", "Ana")],
            &[listing("s1", "p1"), listing("s2", "ghost"), listing("s3", "p1")],
            &[],
        );

        let ids: Vec<&str> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert_eq!(
            sink.events(),
            vec![Diagnostic::DanglingProfessional {
                item_id: "s2".to_string(),
                professional_id: "ghost".to_string(),
            }]
        );
    }

    #[test]
    fn test_favorites_are_marked() {
        let out = CatalogProcessor::new().process(
            &[professional("p1", "Ana")],
            &[listing("s1", "p1"), listing("s2", "p1")],
            &[Favorite::new("s2"), Favorite::new("unknown")],
        );

        assert!(!out[0].is_favorite);
        assert!(out[1].is_favorite);
    }

    #[test]
    fn test_non_finite_numbers_take_defaults() {
        let mut raw = listing("s1", "p1");
        raw.price = Some(f64::NAN);
        raw.rating = Some(f64::INFINITY);

        let out = CatalogProcessor::new().process(&[professional("p1", "Ana")], &[raw], &[]);
        assert_eq!(out[0].price, 0.0);
        assert_eq!(out[0].rating, 0.0);
    }

    #[test]
    fn test_candidates_keep_missing_fields_absent() {
        let mut sparse = listing("s1", "p1");
        sparse.rating = Some(4.0);
        sparse.category = Some(String::new());
        sparse.location = Some(ListingLocation::default());

        let out = CatalogProcessor::new().candidates(&[professional("p1", "Ana")], &[sparse]);

        assert_eq!(out.len(), 1);
        let item = &out[0];
        assert_eq!(item.rating, Some(4.0));
        assert_eq!(item.review_count, None);
        assert_eq!(item.category, None);
        assert_eq!(item.price, None);
        assert_eq!(item.total_bookings, None);
        assert_eq!(item.location.as_ref().and_then(|l| l.city.as_deref()), None);
        assert_eq!(
            item.professional.as_ref().and_then(|p| p.verified),
            Some(true)
        );
    }

    #[test]
    fn test_candidates_drop_dangling_listings() {
        let sink = RecordingSink::new();
        let processor = CatalogProcessor::new().with_sink(Arc::new(sink.clone()));

        let out = processor.candidates(
            &[professional("p1", "Ana")],
            &[listing("s1", "ghost"), listing("s2", "p1")],
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "s2");
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_first_professional_wins_on_duplicate_ids() {
        let out = CatalogProcessor::new().process(
            &[professional("p1", "Ana"), professional("p1", "Bea")],
            &[listing("s1", "p1")],
            &[],
        );
        assert_eq!(out[0].professional.name, "Ana");
    }
}
