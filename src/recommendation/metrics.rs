//! Recommendation Metrics and Performance Monitoring
//!
//! Summarises each recommendation run for monitoring and debugging, and
//! publishes counters through the `metrics` facade. Nothing here affects
//! ranking.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::engine::Recommendations;

/// Metrics for a single recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationMetrics {
    pub request_id: String,
    pub timestamp: i64,

    // Performance
    pub total_duration_ms: u64,

    // Quality
    pub candidates_considered: usize,
    pub recommendations_returned: usize,
    pub avg_score: f64,
    pub reason_distribution: HashMap<&'static str, usize>,
    pub personalized_count: usize,
    pub unique_categories: usize,
    pub fallback_used: bool,
}

impl Default for RecommendationMetrics {
    fn default() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            total_duration_ms: 0,
            candidates_considered: 0,
            recommendations_returned: 0,
            avg_score: 0.0,
            reason_distribution: HashMap::new(),
            personalized_count: 0,
            unique_categories: 0,
            fallback_used: false,
        }
    }
}

impl RecommendationMetrics {
    /// Summarise the outcome of one pipeline run
    pub fn from_run(candidates: usize, outcome: &Recommendations, elapsed: Duration) -> Self {
        let mut metrics = Self {
            total_duration_ms: elapsed.as_millis() as u64,
            candidates_considered: candidates,
            recommendations_returned: outcome.len(),
            ..Default::default()
        };

        match outcome {
            Recommendations::Ranked(items) => {
                let mut categories = HashSet::new();
                let mut score_sum = 0.0;

                for scored in items {
                    score_sum += scored.recommendation_score;
                    *metrics
                        .reason_distribution
                        .entry(scored.recommendation_reason.kind())
                        .or_insert(0) += 1;
                    if scored.recommendation_reason.is_personalized() {
                        metrics.personalized_count += 1;
                    }
                    if let Some(category) = scored.item.category.as_deref() {
                        categories.insert(category);
                    }
                }

                metrics.unique_categories = categories.len();
                if !items.is_empty() {
                    metrics.avg_score = score_sum / items.len() as f64;
                }
            }
            Recommendations::Unranked(items) => {
                metrics.fallback_used = true;
                metrics.unique_categories = items
                    .iter()
                    .filter_map(|i| i.category.as_deref())
                    .collect::<HashSet<_>>()
                    .len();
            }
        }

        metrics
    }

    /// Push counters and timings to the installed `metrics` recorder
    pub fn publish(&self) {
        ::metrics::counter!("tofit_recommendations_total").increment(1);
        ::metrics::histogram!("tofit_recommendation_duration_ms")
            .record(self.total_duration_ms as f64);
        ::metrics::histogram!("tofit_recommendation_candidates")
            .record(self.candidates_considered as f64);
        if !self.fallback_used && self.recommendations_returned > 0 {
            ::metrics::histogram!("tofit_recommendation_personalization").record(
                QualityAnalyzer::personalization_score(
                    self.personalized_count,
                    self.recommendations_returned,
                ),
            );
        }
        if self.fallback_used {
            ::metrics::counter!("tofit_recommendation_fallbacks_total").increment(1);
        }
        for (kind, count) in &self.reason_distribution {
            ::metrics::counter!("tofit_recommendation_reasons_total", "reason" => *kind)
                .increment(*count as u64);
        }
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: String,
}

impl PerformanceTimer {
    pub fn new(label: &str) -> Self {
        Self {
            start: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold: Duration) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            tracing::warn!(
                "Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed.as_millis(),
                threshold.as_millis()
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("{} completed in {}ms", self.label, self.elapsed_ms());
    }
}

/// Recommendation quality analyzer
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Share of distinct categories among the returned items (0-1, higher is better)
    pub fn diversity_score(unique_categories: usize, total_recommendations: usize) -> f64 {
        if total_recommendations == 0 {
            return 0.0;
        }
        (unique_categories as f64 / total_recommendations as f64).min(1.0)
    }

    /// Share of items recommended because of the user's own history (0-1)
    pub fn personalization_score(personalized: usize, total_recommendations: usize) -> f64 {
        if total_recommendations == 0 {
            return 0.0;
        }
        (personalized as f64 / total_recommendations as f64).min(1.0)
    }

    /// Detect potential issues with recommendation quality
    pub fn detect_issues(metrics: &RecommendationMetrics, slow_threshold: Duration) -> Vec<String> {
        let mut issues = Vec::new();

        if metrics.fallback_used {
            issues.push("Scoring fell back to unranked items".to_string());
        }

        if metrics.total_duration_ms > slow_threshold.as_millis() as u64 {
            issues.push(format!("Slow response: {}ms", metrics.total_duration_ms));
        }

        let diversity =
            Self::diversity_score(metrics.unique_categories, metrics.recommendations_returned);
        if metrics.recommendations_returned >= 4 && diversity < 0.25 {
            issues.push(format!("Low category diversity: {:.2}", diversity));
        }

        if metrics.candidates_considered > 0
            && metrics.candidates_considered <= metrics.recommendations_returned
        {
            issues.push("Too few candidates for meaningful ranking".to_string());
        }

        issues
    }
}
