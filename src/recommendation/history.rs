//! Booking History Analysis
//!
//! Reduces a user's completed bookings into the preference signals the scorer
//! consumes: how often each category and city shows up, and how much the user
//! usually spends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category used when a booking carries none
pub const DEFAULT_CATEGORY: &str = "general";
/// City used when a booking carries none
pub const UNKNOWN_CITY: &str = "Unknown";

/// One past booking of the requesting user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<TransactionLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionLocation {
    #[serde(default)]
    pub city: Option<String>,
}

impl Transaction {
    pub fn new(category: impl Into<String>, price: f64) -> Self {
        Self {
            category: Some(category.into()),
            price: Some(price),
            location: None,
        }
    }

    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.location = Some(TransactionLocation {
            city: Some(city.into()),
        });
        self
    }

    fn category_key(&self) -> &str {
        match self.category.as_deref() {
            Some(category) if !category.is_empty() => category,
            _ => DEFAULT_CATEGORY,
        }
    }

    fn city_key(&self) -> &str {
        match self.location.as_ref().and_then(|l| l.city.as_deref()) {
            Some(city) if !city.is_empty() => city,
            _ => UNKNOWN_CITY,
        }
    }
}

/// Aggregate preference signals derived from a booking history.
///
/// Built fresh for every recommendation request and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalysis {
    pub categories_frequency: HashMap<String, u32>,
    pub average_price: f64,
    pub preferred_locations: HashMap<String, u32>,
    pub total_spent: f64,
    pub total_services: usize,
}

impl UserAnalysis {
    /// How many past bookings fell in `category` (0 when never seen)
    pub fn category_frequency(&self, category: &str) -> u32 {
        self.categories_frequency.get(category).copied().unwrap_or(0)
    }

    /// How many past bookings happened in `city` (0 when never seen)
    pub fn location_frequency(&self, city: &str) -> u32 {
        self.preferred_locations.get(city).copied().unwrap_or(0)
    }

    /// Most booked category; ties resolve to the lexicographically smallest key
    pub fn top_category(&self) -> Option<&str> {
        top_entry(&self.categories_frequency)
    }

    /// Most booked city; ties resolve to the lexicographically smallest key
    pub fn top_location(&self) -> Option<&str> {
        top_entry(&self.preferred_locations)
    }

    pub fn is_empty(&self) -> bool {
        self.total_services == 0
    }
}

fn top_entry(table: &HashMap<String, u32>) -> Option<&str> {
    table
        .iter()
        .max_by(|(ka, va), (kb, vb)| va.cmp(vb).then_with(|| kb.cmp(ka)))
        .map(|(k, _)| k.as_str())
}

/// Analyze a booking history.
///
/// An empty history yields the zero analysis. Missing fields fall back to
/// `"general"`, `0` and `"Unknown"` instead of failing.
pub fn analyze(history: &[Transaction]) -> UserAnalysis {
    if history.is_empty() {
        return UserAnalysis {
            total_services: history.len(),
            ..Default::default()
        };
    }

    let mut categories_frequency: HashMap<String, u32> = HashMap::new();
    let mut preferred_locations: HashMap<String, u32> = HashMap::new();
    let mut total_price = 0.0;

    for transaction in history {
        *categories_frequency
            .entry(transaction.category_key().to_string())
            .or_insert(0) += 1;
        total_price += transaction.price.filter(|p| !p.is_nan()).unwrap_or(0.0);
        *preferred_locations
            .entry(transaction.city_key().to_string())
            .or_insert(0) += 1;
    }

    UserAnalysis {
        categories_frequency,
        average_price: total_price / history.len() as f64,
        preferred_locations,
        total_spent: total_price,
        total_services: history.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_empty_history() {
        let analysis = analyze(&[]);
        assert!(analysis.categories_frequency.is_empty());
        assert!(analysis.preferred_locations.is_empty());
        assert_eq!(analysis.average_price, 0.0);
        assert_eq!(analysis.total_spent, 0.0);
        assert_eq!(analysis.total_services, 0);
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_analyze_counts_and_averages() {
        let history = vec![
            Transaction::new("spa", 100.0).in_city("Rosario"),
            Transaction::new("spa", 120.0).in_city("Rosario"),
            Transaction::new("gym", 50.0),
        ];

        let analysis = analyze(&history);
        assert_eq!(analysis.category_frequency("spa"), 2);
        assert_eq!(analysis.category_frequency("gym"), 1);
        assert_eq!(analysis.category_frequency("yoga"), 0);
        assert_eq!(analysis.location_frequency("Rosario"), 2);
        assert_eq!(analysis.location_frequency(UNKNOWN_CITY), 1);
        assert_eq!(analysis.total_spent, 270.0);
        assert!((analysis.average_price - 90.0).abs() < 1e-9);
        assert_eq!(analysis.total_services, 3);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let history = vec![Transaction::default(), Transaction::default()];

        let analysis = analyze(&history);
        assert_eq!(analysis.category_frequency(DEFAULT_CATEGORY), 2);
        assert_eq!(analysis.location_frequency(UNKNOWN_CITY), 2);
        assert_eq!(analysis.average_price, 0.0);
        assert_eq!(analysis.total_services, 2);
    }

    #[test]
    fn test_top_category_and_location() {
        let history = vec![
            Transaction::new("yoga", 10.0).in_city("Córdoba"),
            Transaction::new("spa", 10.0).in_city("Córdoba"),
            Transaction::new("spa", 10.0).in_city("Mendoza"),
        ];

        let analysis = analyze(&history);
        assert_eq!(analysis.top_category(), Some("spa"));
        assert_eq!(analysis.top_location(), Some("Córdoba"));
        assert_eq!(UserAnalysis::default().top_category(), None);
    }

    #[test]
    fn test_transaction_deserializes_partial_json() {
        let tx: Transaction =
            serde_json::from_str(r#"{"category":"spa","location":{}}"#).unwrap();
        assert_eq!(tx.category.as_deref(), Some("spa"));
        assert_eq!(tx.price, None);
        assert_eq!(tx.city_key(), UNKNOWN_CITY);
    }
}
