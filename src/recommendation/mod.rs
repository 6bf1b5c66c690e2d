//! Recommendation Module
//!
//! Ranks marketplace services for ToFit users from their booking history.
//!
//! ## Architecture
//!
//! 1. **History** - Reduce past bookings to category, spend and city signals
//! 2. **Scoring** - Weighted sum of item quality and personalisation terms
//! 3. **Reason** - One human-readable justification per item, first match wins
//! 4. **Engine** - Analyze once, score every candidate, sort, keep the top N
//!
//! ## Algorithm Overview
//!
//! - Rating: `rating * 10`
//! - Review volume: up to 25 points (capped at 50 reviews)
//! - Category affinity: 15 per past booking in the same category
//! - Price similarity: up to 20, decaying with distance from average spend
//! - Location affinity: 10 per past booking in the same city
//! - Verified professional: +5
//! - Popularity: up to 10 (capped at 100 bookings)
//! - Unreviewed penalty: -10 for items with exactly zero reviews
//!
//! Totals are clamped at zero.

pub mod diagnostics;
pub mod engine;
pub mod history;
pub mod metrics;
pub mod reason;
pub mod scoring;

// Re-export the types that are actually used externally
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use engine::{RecommendationEngine, Recommendations, ScoredItem, DEFAULT_TOP_N};
pub use history::{analyze, Transaction, UserAnalysis};
pub use reason::{select_reason, RecommendationReason};
pub use scoring::{score, try_score, CandidateItem, RecommendationPreferences, ScoringWeights};
