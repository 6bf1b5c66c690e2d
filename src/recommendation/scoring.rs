//! Candidate Scoring
//!
//! Combines a candidate's intrinsic quality signals (rating, reviews,
//! bookings, verification) with the personalisation signals from
//! [`UserAnalysis`] into one non-negative score.
//!
//! ## Terms
//!
//! | Term                  | Contribution                                        |
//! |-----------------------|-----------------------------------------------------|
//! | Rating                | `rating * 10`                                       |
//! | Review volume         | `min(review_count, 50) * 0.5`                       |
//! | Category affinity     | `category_frequency * 15`                           |
//! | Price similarity      | `max(0, 20 - |price - avg| / avg * 20)` if avg > 0  |
//! | Location affinity     | `location_frequency * 10`                           |
//! | Verified professional | `+5`                                                |
//! | Popularity            | `min(total_bookings, 100) * 0.1`                    |
//! | Unreviewed penalty    | `-10` when `review_count` is exactly 0              |
//!
//! The total is clamped at zero.

use serde::{Deserialize, Serialize};

use super::history::UserAnalysis;
use crate::error::{Error, Result};

/// A bookable service or product considered for recommendation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, alias = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ItemLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional: Option<ItemProfessional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bookings: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemProfessional {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl CandidateItem {
    pub fn city(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.city.as_deref())
    }

    pub fn is_verified(&self) -> bool {
        self.professional
            .as_ref()
            .and_then(|p| p.verified)
            .unwrap_or(false)
    }
}

/// Opaque caller hints passed alongside a recommendation request.
///
/// Accepted for contract compatibility; no scoring term reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationPreferences(pub serde_json::Map<String, serde_json::Value>);

/// Scoring weights (can be tuned)
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub rating: f64,
    pub review: f64,
    pub review_cap: u32,
    pub category_affinity: f64,
    pub price_match: f64,
    pub location_affinity: f64,
    pub verified_bonus: f64,
    pub popularity: f64,
    pub popularity_cap: u32,
    pub unreviewed_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rating: 10.0,
            review: 0.5,
            review_cap: 50,
            category_affinity: 15.0,
            price_match: 20.0,
            location_affinity: 10.0,
            verified_bonus: 5.0,
            popularity: 0.1,
            popularity_cap: 100,
            unreviewed_penalty: 10.0,
        }
    }
}

/// Per-term contributions for one candidate, before clamping
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub rating: f64,
    pub reviews: f64,
    pub category: f64,
    pub price: f64,
    pub location: f64,
    pub verified: f64,
    pub popularity: f64,
    pub unreviewed_penalty: f64,
}

impl ScoreBreakdown {
    /// Compute every term for `item` against `analysis`
    pub fn compute(item: &CandidateItem, analysis: &UserAnalysis, weights: &ScoringWeights) -> Self {
        let review_count = item.review_count.unwrap_or(0);
        let category = item
            .category
            .as_deref()
            .map(|c| analysis.category_frequency(c))
            .unwrap_or(0);
        let location = item
            .city()
            .map(|c| analysis.location_frequency(c))
            .unwrap_or(0);

        Self {
            rating: item.rating.unwrap_or(0.0) * weights.rating,
            reviews: review_count.min(weights.review_cap) as f64 * weights.review,
            category: category as f64 * weights.category_affinity,
            price: price_similarity(item.price.unwrap_or(0.0), analysis.average_price, weights),
            location: location as f64 * weights.location_affinity,
            verified: if item.is_verified() {
                weights.verified_bonus
            } else {
                0.0
            },
            popularity: item.total_bookings.unwrap_or(0).min(weights.popularity_cap) as f64
                * weights.popularity,
            // Only an explicit zero is penalised; a missing count is not
            unreviewed_penalty: if item.review_count == Some(0) {
                -weights.unreviewed_penalty
            } else {
                0.0
            },
        }
    }

    fn terms(&self) -> [(&'static str, f64); 8] {
        [
            ("rating", self.rating),
            ("reviews", self.reviews),
            ("category", self.category),
            ("price", self.price),
            ("location", self.location),
            ("verified", self.verified),
            ("popularity", self.popularity),
            ("unreviewed_penalty", self.unreviewed_penalty),
        ]
    }

    /// Sum of all terms (may be negative)
    pub fn raw_total(&self) -> f64 {
        self.terms().iter().map(|(_, v)| v).sum()
    }
}

/// Linear decay from `price_match` at an exact match to 0 once the gap reaches
/// the user's average spend. No bonus without spending history.
fn price_similarity(price: f64, average_price: f64, weights: &ScoringWeights) -> f64 {
    if average_price > 0.0 {
        let price_diff = (price - average_price).abs();
        (weights.price_match - (price_diff / average_price) * weights.price_match).max(0.0)
    } else {
        0.0
    }
}

/// Score a candidate, failing if any term is not a finite number.
pub fn try_score(
    item: &CandidateItem,
    analysis: &UserAnalysis,
    _preferences: &RecommendationPreferences,
    weights: &ScoringWeights,
) -> Result<f64> {
    let breakdown = ScoreBreakdown::compute(item, analysis, weights);

    if let Some((term, _)) = breakdown.terms().into_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::NonFiniteScore {
            item_id: item.id.clone(),
            term,
        });
    }

    Ok(breakdown.raw_total().max(0.0))
}

/// Score a candidate. Never negative; malformed numeric input scores 0.
pub fn score(
    item: &CandidateItem,
    analysis: &UserAnalysis,
    preferences: &RecommendationPreferences,
    weights: &ScoringWeights,
) -> f64 {
    try_score(item, analysis, preferences, weights).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::history::{analyze, Transaction};

    fn spa_history() -> UserAnalysis {
        analyze(&[
            Transaction::new("spa", 100.0),
            Transaction::new("spa", 120.0),
        ])
    }

    fn item(id: &str) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_item_scores_zero() {
        let s = score(
            &item("x"),
            &UserAnalysis::default(),
            &RecommendationPreferences::default(),
            &ScoringWeights::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_review_and_popularity_caps() {
        let mut candidate = item("x");
        candidate.review_count = Some(500);
        candidate.total_bookings = Some(10_000);

        let b = ScoreBreakdown::compute(&candidate, &UserAnalysis::default(), &ScoringWeights::default());
        assert_eq!(b.reviews, 25.0);
        assert!((b.popularity - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_similarity_decays_to_zero() {
        let weights = ScoringWeights::default();
        assert_eq!(price_similarity(110.0, 110.0, &weights), 20.0);
        assert!((price_similarity(165.0, 110.0, &weights) - 10.0).abs() < 1e-9);
        assert_eq!(price_similarity(220.0, 110.0, &weights), 0.0);
        assert_eq!(price_similarity(1000.0, 110.0, &weights), 0.0);
        assert_eq!(price_similarity(50.0, 0.0, &weights), 0.0);
    }

    #[test]
    fn test_unreviewed_penalty_only_for_explicit_zero() {
        let weights = ScoringWeights::default();
        let analysis = UserAnalysis::default();

        let mut zero = item("zero");
        zero.review_count = Some(0);
        let missing = item("missing");

        assert_eq!(
            ScoreBreakdown::compute(&zero, &analysis, &weights).unreviewed_penalty,
            -10.0
        );
        assert_eq!(
            ScoreBreakdown::compute(&missing, &analysis, &weights).unreviewed_penalty,
            0.0
        );
    }

    #[test]
    fn test_negative_total_is_clamped() {
        let mut candidate = item("new");
        candidate.review_count = Some(0);

        let s = score(
            &candidate,
            &UserAnalysis::default(),
            &RecommendationPreferences::default(),
            &ScoringWeights::default(),
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_personalised_terms() {
        let analysis = analyze(&[
            Transaction::new("spa", 100.0).in_city("Rosario"),
            Transaction::new("spa", 100.0).in_city("Rosario"),
        ]);
        let candidate = CandidateItem {
            id: "s".to_string(),
            category: Some("spa".to_string()),
            price: Some(100.0),
            location: Some(ItemLocation {
                city: Some("Rosario".to_string()),
            }),
            ..Default::default()
        };

        let b = ScoreBreakdown::compute(&candidate, &analysis, &ScoringWeights::default());
        assert_eq!(b.category, 30.0);
        assert_eq!(b.location, 20.0);
        assert_eq!(b.price, 20.0);
    }

    #[test]
    fn test_worked_example_scores() {
        let analysis = spa_history();
        let weights = ScoringWeights::default();
        let prefs = RecommendationPreferences::default();

        let a = CandidateItem {
            id: "a".to_string(),
            category: Some("spa".to_string()),
            rating: Some(4.5),
            review_count: Some(20),
            price: Some(110.0),
            professional: Some(ItemProfessional {
                verified: Some(true),
                ..Default::default()
            }),
            total_bookings: Some(60),
            ..Default::default()
        };
        let b = CandidateItem {
            id: "b".to_string(),
            category: Some("gym".to_string()),
            rating: Some(5.0),
            review_count: Some(0),
            price: Some(110.0),
            ..Default::default()
        };

        let score_a = score(&a, &analysis, &prefs, &weights);
        let score_b = score(&b, &analysis, &prefs, &weights);

        assert!((score_a - 116.0).abs() < 1e-9);
        assert!((score_b - 60.0).abs() < 1e-9);
        assert!(score_a > score_b);
    }

    #[test]
    fn test_non_finite_input_fails_try_score() {
        let mut candidate = item("nan");
        candidate.rating = Some(f64::NAN);

        let result = try_score(
            &candidate,
            &UserAnalysis::default(),
            &RecommendationPreferences::default(),
            &ScoringWeights::default(),
        );
        assert!(matches!(
            result,
            Err(Error::NonFiniteScore { term: "rating", .. })
        ));
        assert_eq!(
            score(
                &candidate,
                &UserAnalysis::default(),
                &RecommendationPreferences::default(),
                &ScoringWeights::default()
            ),
            0.0
        );
    }

    #[test]
    fn test_categoria_alias_deserializes() {
        let candidate: CandidateItem =
            serde_json::from_str(r#"{"id":"1","categoria":"spa","reviewCount":3}"#).unwrap();
        assert_eq!(candidate.category.as_deref(), Some("spa"));
        assert_eq!(candidate.review_count, Some(3));
    }
}
