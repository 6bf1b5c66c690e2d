//! Catalog ordering
//!
//! Named strategies; unknown names sort by rating. All sorts are stable, so
//! equal keys keep their incoming order.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use super::model::CatalogEntity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortStrategy {
    /// Rating, highest first
    #[default]
    Rating,
    PriceAsc,
    PriceDesc,
    /// Review count, highest first
    Reviews,
    /// Total bookings, highest first
    Popularity,
    /// Creation date, newest first; undated listings go last
    Newest,
    /// Professional name, alphabetical
    Name,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Reviews => "reviews",
            Self::Popularity => "popularity",
            Self::Newest => "newest",
            Self::Name => "name",
        }
    }

    fn compare(&self, a: &CatalogEntity, b: &CatalogEntity) -> Ordering {
        match self {
            Self::Rating => b.rating.total_cmp(&a.rating),
            Self::PriceAsc => a.price.total_cmp(&b.price),
            Self::PriceDesc => b.price.total_cmp(&a.price),
            Self::Reviews => b.review_count.cmp(&a.review_count),
            Self::Popularity => b.total_bookings.cmp(&a.total_bookings),
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Name => compare_names(&a.professional.name, &b.professional.name),
        }
    }
}

impl FromStr for SortStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "reviews" => Self::Reviews,
            "popularity" => Self::Popularity,
            "newest" => Self::Newest,
            "name" => Self::Name,
            _ => Self::Rating,
        })
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SortStrategy {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Accepts any string; unknown names become `Rating`
impl<'de> Deserialize<'de> for SortStrategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse::<SortStrategy>().unwrap_or_default())
    }
}

/// Sort `entities` in place by `strategy`
pub fn sort_catalog(entities: &mut [CatalogEntity], strategy: SortStrategy) {
    entities.sort_by(|a, b| strategy.compare(a, b));
}

/// Sort by a strategy name, falling back to rating for unknown names
pub fn sort_catalog_by_name(entities: &mut [CatalogEntity], strategy: &str) {
    sort_catalog(entities, strategy.parse().unwrap_or_default());
}

/// Spanish-aware name order: case and acute accents are ignored, `ñ` sorts
/// after `n`. Names that fold equal fall back to plain string order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> Vec<char> {
    let mut key = Vec::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'ä' | 'â' => key.push('a'),
            'é' | 'è' | 'ë' | 'ê' => key.push('e'),
            'í' | 'ì' | 'ï' | 'î' => key.push('i'),
            'ó' | 'ò' | 'ö' | 'ô' => key.push('o'),
            'ú' | 'ù' | 'ü' | 'û' => key.push('u'),
            'ç' => key.push('c'),
            // `n` plus a marker above every letter puts ñ between n and o
            'ñ' => {
                key.push('n');
                key.push(char::MAX);
            }
            other => key.push(other),
        }
    }
    key
}
