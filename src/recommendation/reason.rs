//! Recommendation reasons
//!
//! Every recommended item carries exactly one human-readable justification.
//! Reasons are checked in a fixed priority order and the first rule that
//! applies wins; later rules are never consulted.

use serde::{Serialize, Serializer};
use std::fmt;

use super::history::UserAnalysis;
use super::scoring::CandidateItem;

/// Minimum rating for the "highly rated" reason
pub const HIGHLY_RATED_THRESHOLD: f64 = 4.5;
/// Minimum bookings for the "in demand" reason
pub const IN_DEMAND_THRESHOLD: u32 = 50;

/// Why this item was recommended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationReason {
    /// The user has booked this category before
    CategoryAffinity { category: String },
    /// Rated at or above [`HIGHLY_RATED_THRESHOLD`]
    HighlyRated,
    /// Booked at least [`IN_DEMAND_THRESHOLD`] times
    InDemand,
    /// Offered by a verified professional
    VerifiedProfessional,
    /// Located in a city the user has booked in before
    NearbyLocation { city: String },
    /// Nothing specific applied
    ForYou,
}

impl RecommendationReason {
    /// Short stable label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CategoryAffinity { .. } => "category_affinity",
            Self::HighlyRated => "highly_rated",
            Self::InDemand => "in_demand",
            Self::VerifiedProfessional => "verified_professional",
            Self::NearbyLocation { .. } => "nearby_location",
            Self::ForYou => "for_you",
        }
    }

    /// True when the reason comes from the user's own history
    pub fn is_personalized(&self) -> bool {
        matches!(
            self,
            Self::CategoryAffinity { .. } | Self::NearbyLocation { .. }
        )
    }
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryAffinity { category } => write!(f, "Te gusta {}", category),
            Self::HighlyRated => write!(f, "Altamente calificado"),
            Self::InDemand => write!(f, "Muy solicitado"),
            Self::VerifiedProfessional => write!(f, "Profesional verificado"),
            Self::NearbyLocation { city } => write!(f, "En {}", city),
            Self::ForYou => write!(f, "Recomendado para ti"),
        }
    }
}

// Clients receive the display string, not the variant
impl Serialize for RecommendationReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single rule in the priority chain
pub type ReasonRule = fn(&CandidateItem, &UserAnalysis) -> Option<RecommendationReason>;

/// Rules in priority order
pub const REASON_CHAIN: [ReasonRule; 5] = [
    category_affinity,
    highly_rated,
    in_demand,
    verified_professional,
    nearby_location,
];

fn category_affinity(item: &CandidateItem, analysis: &UserAnalysis) -> Option<RecommendationReason> {
    let category = item.category.as_deref()?;
    (analysis.category_frequency(category) > 0).then(|| RecommendationReason::CategoryAffinity {
        category: category.to_string(),
    })
}

fn highly_rated(item: &CandidateItem, _: &UserAnalysis) -> Option<RecommendationReason> {
    let rating = item.rating?;
    (rating >= HIGHLY_RATED_THRESHOLD).then_some(RecommendationReason::HighlyRated)
}

fn in_demand(item: &CandidateItem, _: &UserAnalysis) -> Option<RecommendationReason> {
    let bookings = item.total_bookings?;
    (bookings >= IN_DEMAND_THRESHOLD).then_some(RecommendationReason::InDemand)
}

fn verified_professional(item: &CandidateItem, _: &UserAnalysis) -> Option<RecommendationReason> {
    item.is_verified()
        .then_some(RecommendationReason::VerifiedProfessional)
}

fn nearby_location(item: &CandidateItem, analysis: &UserAnalysis) -> Option<RecommendationReason> {
    let city = item.city()?;
    (analysis.location_frequency(city) > 0).then(|| RecommendationReason::NearbyLocation {
        city: city.to_string(),
    })
}

/// Pick the first applicable reason, falling back to [`RecommendationReason::ForYou`]
pub fn select_reason(item: &CandidateItem, analysis: &UserAnalysis) -> RecommendationReason {
    REASON_CHAIN
        .iter()
        .find_map(|rule| rule(item, analysis))
        .unwrap_or(RecommendationReason::ForYou)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::history::{analyze, Transaction};
    use crate::recommendation::scoring::{ItemLocation, ItemProfessional};

    fn everything_item() -> CandidateItem {
        CandidateItem {
            id: "1".to_string(),
            category: Some("spa".to_string()),
            rating: Some(4.9),
            total_bookings: Some(80),
            professional: Some(ItemProfessional {
                verified: Some(true),
                ..Default::default()
            }),
            location: Some(ItemLocation {
                city: Some("Rosario".to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let analysis = analyze(&[Transaction::new("spa", 50.0).in_city("Rosario")]);
        let reason = select_reason(&everything_item(), &analysis);
        assert_eq!(reason, RecommendationReason::CategoryAffinity {
            category: "spa".to_string()
        });
        assert_eq!(reason.to_string(), "Te gusta spa");
    }

    #[test]
    fn test_priority_order_without_history() {
        let analysis = UserAnalysis::default();
        let mut item = everything_item();
        assert_eq!(select_reason(&item, &analysis), RecommendationReason::HighlyRated);

        item.rating = Some(4.4);
        assert_eq!(select_reason(&item, &analysis), RecommendationReason::InDemand);

        item.total_bookings = Some(49);
        assert_eq!(
            select_reason(&item, &analysis),
            RecommendationReason::VerifiedProfessional
        );

        item.professional = None;
        assert_eq!(select_reason(&item, &analysis), RecommendationReason::ForYou);
    }

    #[test]
    fn test_location_reason() {
        let analysis = analyze(&[Transaction::new("gym", 20.0).in_city("Rosario")]);
        let item = CandidateItem {
            id: "2".to_string(),
            category: Some("yoga".to_string()),
            location: Some(ItemLocation {
                city: Some("Rosario".to_string()),
            }),
            ..Default::default()
        };

        let reason = select_reason(&item, &analysis);
        assert_eq!(reason.to_string(), "En Rosario");
        assert!(reason.is_personalized());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(RecommendationReason::HighlyRated.to_string(), "Altamente calificado");
        assert_eq!(RecommendationReason::InDemand.to_string(), "Muy solicitado");
        assert_eq!(
            RecommendationReason::VerifiedProfessional.to_string(),
            "Profesional verificado"
        );
        assert_eq!(RecommendationReason::ForYou.to_string(), "Recomendado para ti");
    }

    #[test]
    fn test_serializes_as_display_string() {
        let json = serde_json::to_string(&RecommendationReason::InDemand).unwrap();
        assert_eq!(json, "\"Muy solicitado\"");
    }
}
