//! Catalog records
//!
//! Raw records as the marketplace stores them, and the merged entity the
//! processor produces for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// City used when a listing has no location
pub const DEFAULT_CITY: &str = "Buenos Aires";
/// Category used when a listing has none
pub const DEFAULT_CATEGORY: &str = "general";
/// Session length used when a listing does not say
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// A professional offering services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// A service listing as stored, every descriptive field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListing {
    pub id: String,
    pub professional_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub total_bookings: Option<u32>,
    #[serde(default)]
    pub location: Option<ListingLocation>,
    #[serde(default)]
    pub payment_methods: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub neighborhoods: Option<Vec<String>>,
}

/// One of the user's saved listings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub item_id: String,
}

impl Favorite {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLocation {
    pub city: String,
    pub neighborhoods: Vec<String>,
}

impl Default for ServiceLocation {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            neighborhoods: Vec::new(),
        }
    }
}

/// The professional fields carried on a catalog entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalSummary {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub verified: bool,
}

/// A listing merged with its professional, defaults applied and favourite
/// status resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub review_count: u32,
    pub total_bookings: u32,
    pub location: ServiceLocation,
    pub payment_methods: Vec<String>,
    pub images: Vec<String>,
    pub duration_minutes: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub professional: ProfessionalSummary,
    pub is_favorite: bool,
}
