//! Catalog filters
//!
//! Every filter is optional and all of them must hold for an entity to be
//! kept. Blank strings and non-finite bounds are ignored.

use serde::Deserialize;

use super::model::CatalogEntity;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogFilters {
    /// Case-insensitive substring of title, professional name, description or category
    pub search: Option<String>,
    /// Exact, case-sensitive category; surrounding whitespace is ignored on both sides
    pub category: Option<String>,
    /// Case-insensitive substring of the city or any neighborhood
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub verified_only: bool,
}

impl CatalogFilters {
    pub fn is_empty(&self) -> bool {
        blank(&self.search).is_none()
            && blank(&self.category).is_none()
            && blank(&self.location).is_none()
            && bound(self.min_price).is_none()
            && bound(self.max_price).is_none()
            && bound(self.min_rating).is_none()
            && !self.verified_only
    }

    /// True when `entity` passes every active filter
    pub fn matches(&self, entity: &CatalogEntity) -> bool {
        if let Some(search) = blank(&self.search) {
            let needle = search.to_lowercase();
            let hit = [
                entity.title.as_str(),
                entity.professional.name.as_str(),
                entity.description.as_str(),
                entity.category.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(category) = blank(&self.category) {
            if entity.category.trim() != category {
                return false;
            }
        }

        if let Some(location) = blank(&self.location) {
            let needle = location.to_lowercase();
            let hit = entity.location.city.to_lowercase().contains(&needle)
                || entity
                    .location
                    .neighborhoods
                    .iter()
                    .any(|n| n.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if bound(self.min_price).is_some_and(|min| entity.price < min) {
            return false;
        }
        if bound(self.max_price).is_some_and(|max| entity.price > max) {
            return false;
        }
        if bound(self.min_rating).is_some_and(|min| entity.rating < min) {
            return false;
        }

        !self.verified_only || entity.professional.verified
    }
}

fn blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn bound(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Keep the entities that pass `filters`, in their original order
pub fn filter_catalog(entities: Vec<CatalogEntity>, filters: &CatalogFilters) -> Vec<CatalogEntity> {
    if filters.is_empty() {
        return entities;
    }
    entities.into_iter().filter(|e| filters.matches(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{ProfessionalSummary, ServiceLocation};

    fn entity(id: &str, category: &str, price: f64, rating: f64) -> CatalogEntity {
        CatalogEntity {
            id: id.to_string(),
            title: format!("Clase de {category}"),
            description: String::new(),
            category: category.to_string(),
            price,
            rating,
            review_count: 0,
            total_bookings: 0,
            location: ServiceLocation {
                city: "Buenos Aires".to_string(),
                neighborhoods: vec!["Palermo".to_string()],
            },
            payment_methods: Vec::new(),
            images: Vec::new(),
            duration_minutes: 60,
            created_at: None,
            professional: ProfessionalSummary {
                id: "p".to_string(),
                name: "Lucía Gómez".to_string(),
                avatar_url: None,
                verified: id.ends_with('v'),
            },
            is_favorite: false,
        }
    }

    fn sample() -> Vec<CatalogEntity> {
        vec![
            entity("1v", "yoga", 100.0, 4.8),
            entity("2", "pilates", 150.0, 4.0),
            entity("3v", "yoga", 200.0, 3.5),
        ]
    }

    fn ids(entities: &[CatalogEntity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filters_are_a_no_op() {
        let filters = CatalogFilters {
            search: Some("   ".to_string()),
            category: Some(String::new()),
            min_price: Some(f64::NAN),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert_eq!(filter_catalog(sample(), &filters), sample());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let filters = CatalogFilters {
            search: Some("LUCÍA".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_catalog(sample(), &filters).len(), 3);

        let filters = CatalogFilters {
            search: Some("pila".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_catalog(sample(), &filters)), vec!["2"]);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let filters = CatalogFilters {
            min_price: Some(100.0),
            max_price: Some(150.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_catalog(sample(), &filters)), vec!["1v", "2"]);
    }

    #[test]
    fn test_filters_are_combined() {
        let filters = CatalogFilters {
            category: Some("yoga".to_string()),
            min_rating: Some(4.0),
            verified_only: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter_catalog(sample(), &filters)), vec!["1v"]);
    }

    #[test]
    fn test_location_matches_neighborhood() {
        let filters = CatalogFilters {
            location: Some("palermo".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_catalog(sample(), &filters).len(), 3);

        let filters = CatalogFilters {
            location: Some("Rosario".to_string()),
            ..Default::default()
        };
        assert!(filter_catalog(sample(), &filters).is_empty());
    }

    #[test]
    fn test_category_ignores_surrounding_whitespace() {
        let items = vec![
            entity("1", "yoga ", 100.0, 4.0),
            entity("2", "yoga", 100.0, 4.0),
            entity("3", "Yoga", 100.0, 4.0),
        ];
        let filters = CatalogFilters {
            category: Some(" yoga".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_catalog(items, &filters)), vec!["1", "2"]);
    }
}
