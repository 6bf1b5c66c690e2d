//! Recommendation Engine
//!
//! Ranks a catalog for one user: analyze the booking history once, score and
//! explain every candidate, sort by score descending and keep the top N.
//!
//! The engine never fails. If any candidate cannot be scored it reports a
//! diagnostic and returns the first N catalog items untouched.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::diagnostics::{tracing_sink, Diagnostic, DiagnosticSink};
use super::history::{analyze, Transaction, UserAnalysis};
use super::metrics::{PerformanceTimer, QualityAnalyzer, RecommendationMetrics};
use super::reason::{select_reason, RecommendationReason};
use super::scoring::{try_score, CandidateItem, RecommendationPreferences, ScoringWeights};
use crate::error::Result;

/// Number of items returned when nothing else is configured
pub const DEFAULT_TOP_N: usize = 8;

/// A candidate together with its score and the reason it was picked
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: CandidateItem,
    pub recommendation_score: f64,
    pub recommendation_reason: RecommendationReason,
}

/// Output of a recommendation run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Recommendations {
    /// Scored and sorted by score descending
    Ranked(Vec<ScoredItem>),
    /// Scoring failed; the first catalog items in input order
    Unranked(Vec<CandidateItem>),
}

impl Recommendations {
    pub fn len(&self) -> usize {
        match self {
            Self::Ranked(items) => items.len(),
            Self::Unranked(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ranked(&self) -> bool {
        matches!(self, Self::Ranked(_))
    }

    /// Ids in output order, whichever variant this is
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Self::Ranked(items) => items.iter().map(|s| s.item.id.as_str()).collect(),
            Self::Unranked(items) => items.iter().map(|i| i.id.as_str()).collect(),
        }
    }
}

impl Default for Recommendations {
    fn default() -> Self {
        Self::Ranked(Vec::new())
    }
}

/// Main recommendation engine
#[derive(Clone)]
pub struct RecommendationEngine {
    weights: ScoringWeights,
    top_n: usize,
    slow_threshold: Duration,
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self {
            weights: ScoringWeights::default(),
            top_n: DEFAULT_TOP_N,
            slow_threshold: Duration::from_millis(50),
            sink: tracing_sink(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Cap on returned items; values below 1 are raised to 1
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank `catalog` for the user whose bookings are `history`.
    ///
    /// Items with equal scores keep their catalog order.
    pub fn recommend(
        &self,
        catalog: &[CandidateItem],
        history: &[Transaction],
        preferences: &RecommendationPreferences,
    ) -> Recommendations {
        if catalog.is_empty() {
            return Recommendations::default();
        }

        let timer = PerformanceTimer::new("recommend");
        let analysis = analyze(history);

        let outcome = match self.rank(catalog, &analysis, preferences) {
            Ok(ranked) => Recommendations::Ranked(ranked),
            Err(e) => {
                let fallback: Vec<CandidateItem> =
                    catalog.iter().take(self.top_n).cloned().collect();
                self.sink.report(Diagnostic::ScoringFailed {
                    error: e.to_string(),
                    fallback_len: fallback.len(),
                });
                Recommendations::Unranked(fallback)
            }
        };

        timer.log_if_slow(self.slow_threshold);
        let metrics = RecommendationMetrics::from_run(catalog.len(), &outcome, timer.elapsed());
        for issue in QualityAnalyzer::detect_issues(&metrics, self.slow_threshold) {
            tracing::debug!(request_id = %metrics.request_id, "Recommendation quality: {}", issue);
        }
        metrics.publish();

        outcome
    }

    /// Score, explain and sort every candidate, keeping the top N
    pub fn rank(
        &self,
        catalog: &[CandidateItem],
        analysis: &UserAnalysis,
        preferences: &RecommendationPreferences,
    ) -> Result<Vec<ScoredItem>> {
        use rayon::prelude::*;

        // Indexed parallel collect keeps catalog order, so the stable sort
        // below resolves ties by input position
        let mut scored: Vec<ScoredItem> = catalog
            .par_iter()
            .map(|item| {
                let recommendation_score = try_score(item, analysis, preferences, &self.weights)?;
                Ok(ScoredItem {
                    recommendation_reason: select_reason(item, analysis),
                    item: item.clone(),
                    recommendation_score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|a, b| b.recommendation_score.total_cmp(&a.recommendation_score));
        scored.truncate(self.top_n);

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::diagnostics::RecordingSink;

    fn rated(id: &str, rating: f64) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            rating: Some(rating),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_catalog_returns_empty() {
        let engine = RecommendationEngine::new();
        let out = engine.recommend(
            &[],
            &[Transaction::new("spa", 10.0)],
            &RecommendationPreferences::default(),
        );
        assert!(out.is_empty());
        assert!(out.is_ranked());
    }

    #[test]
    fn test_sorted_descending_and_truncated() {
        let catalog: Vec<CandidateItem> = (0..20)
            .map(|i| rated(&format!("item-{i}"), (i % 5) as f64))
            .collect();

        let out = RecommendationEngine::new().recommend(
            &catalog,
            &[],
            &RecommendationPreferences::default(),
        );

        let Recommendations::Ranked(items) = out else {
            panic!("expected ranked output");
        };
        assert_eq!(items.len(), DEFAULT_TOP_N);
        assert!(items
            .windows(2)
            .all(|w| w[0].recommendation_score >= w[1].recommendation_score));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = vec![rated("a", 3.0), rated("b", 4.0), rated("c", 3.0), rated("d", 3.0)];
        let out = RecommendationEngine::new().recommend(
            &catalog,
            &[],
            &RecommendationPreferences::default(),
        );
        assert_eq!(out.ids(), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_custom_top_n() {
        let catalog: Vec<CandidateItem> = (0..5).map(|i| rated(&i.to_string(), 1.0)).collect();
        let engine = RecommendationEngine::new().with_top_n(2);
        let out = engine.recommend(&catalog, &[], &RecommendationPreferences::default());
        assert_eq!(out.len(), 2);

        assert_eq!(RecommendationEngine::new().with_top_n(0).top_n(), 1);
    }

    #[test]
    fn test_scoring_failure_falls_back_to_catalog_order() {
        let sink = RecordingSink::new();
        let engine = RecommendationEngine::new().with_sink(Arc::new(sink.clone()));

        let mut catalog: Vec<CandidateItem> =
            (0..10).map(|i| rated(&format!("item-{i}"), i as f64)).collect();
        catalog[4].rating = Some(f64::NAN);

        let out = engine.recommend(
            &catalog,
            &[Transaction::new("spa", 100.0)],
            &RecommendationPreferences::default(),
        );

        assert!(!out.is_ranked());
        assert_eq!(
            out.ids(),
            vec!["item-0", "item-1", "item-2", "item-3", "item-4", "item-5", "item-6", "item-7"]
        );

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Diagnostic::ScoringFailed { fallback_len: 8, .. }
        ));
    }

    #[test]
    fn test_scored_item_serializes_flat() {
        let scored = ScoredItem {
            item: CandidateItem {
                id: "x".to_string(),
                category: Some("spa".to_string()),
                ..Default::default()
            },
            recommendation_score: 12.5,
            recommendation_reason: RecommendationReason::ForYou,
        };

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["id"], "x");
        assert_eq!(json["category"], "spa");
        assert_eq!(json["recommendationScore"], 12.5);
        assert_eq!(json["recommendationReason"], "Recomendado para ti");
    }

    #[test]
    fn test_recommendations_serialize_as_array() {
        let out = Recommendations::Unranked(vec![rated("a", 1.0)]);
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["id"], "a");
    }
}
