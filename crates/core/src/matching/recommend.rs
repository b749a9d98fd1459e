//! Buyer-facing recommendations derived from tiered matches.

use serde::{Deserialize, Serialize};

use super::matcher::MatchCandidate;
use super::tier::MatchTier;
use crate::domain::listing::CatalogListing;

/// Listings shown for exact/strong tiers.
pub const CONFIDENT_SAMPLE: usize = 3;
/// Listings shown for every other tier.
pub const TENTATIVE_SAMPLE: usize = 2;

pub const HINT_PROCEED: &str = "Proceed with confidence";
pub const HINT_VERIFY: &str = "Verify before purchasing";
pub const HINT_RETAKE: &str = "Retake the photo or enter the plant name manually";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Exact,
    Strong,
    Good,
    Weak,
    Poor,
    None,
}

impl From<MatchTier> for RecommendationTier {
    fn from(tier: MatchTier) -> Self {
        match tier {
            MatchTier::Exact => Self::Exact,
            MatchTier::Strong => Self::Strong,
            MatchTier::Good => Self::Good,
            MatchTier::Weak => Self::Weak,
            MatchTier::Poor => Self::Poor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub tier: RecommendationTier,
    /// Matches in the tier, not just the ones sampled into `listings`.
    pub count: usize,
    pub message: String,
    pub action_hint: String,
    pub listings: Vec<CatalogListing>,
}

/// One recommendation per non-empty tier in priority order, or a single
/// `none` recommendation when nothing matched.
pub fn build_recommendations(plant_name: &str, matches: &[MatchCandidate]) -> Vec<Recommendation> {
    let recommendations: Vec<Recommendation> = MatchTier::ALL
        .into_iter()
        .filter_map(|tier| {
            let in_tier: Vec<&MatchCandidate> =
                matches.iter().filter(|candidate| candidate.tier == tier).collect();
            (!in_tier.is_empty()).then(|| tier_recommendation(plant_name, tier, &in_tier))
        })
        .collect();

    if recommendations.is_empty() {
        return vec![no_match_recommendation(plant_name)];
    }
    recommendations
}

fn tier_recommendation(
    plant_name: &str,
    tier: MatchTier,
    in_tier: &[&MatchCandidate],
) -> Recommendation {
    let count = in_tier.len();
    let single = count == 1;
    let noun = if single { "listing" } else { "listings" };
    let message = match tier {
        MatchTier::Exact => {
            format!("{count} {noun} {} {plant_name} exactly.", if single { "matches" } else { "match" })
        }
        MatchTier::Strong => {
            format!("{count} {noun} closely {} {plant_name}.", if single { "matches" } else { "match" })
        }
        MatchTier::Good => format!(
            "{count} {noun} {} a good match for {plant_name}.",
            if single { "is" } else { "are" }
        ),
        MatchTier::Weak => format!("{count} {noun} might be {plant_name}."),
        MatchTier::Poor => format!(
            "{count} {noun} only loosely {} {plant_name}.",
            if single { "resembles" } else { "resemble" }
        ),
    };
    let (action_hint, sample) = if tier.is_confident() {
        (HINT_PROCEED, CONFIDENT_SAMPLE)
    } else {
        (HINT_VERIFY, TENTATIVE_SAMPLE)
    };

    Recommendation {
        tier: tier.into(),
        count,
        message,
        action_hint: action_hint.to_string(),
        listings: in_tier.iter().take(sample).map(|candidate| candidate.listing.clone()).collect(),
    }
}

fn no_match_recommendation(plant_name: &str) -> Recommendation {
    let message = if plant_name.trim().is_empty() {
        "No listings match this plant.".to_string()
    } else {
        format!("No listings match {plant_name}.")
    };

    Recommendation {
        tier: RecommendationTier::None,
        count: 0,
        message,
        action_hint: HINT_RETAKE.to_string(),
        listings: Vec::new(),
    }
}
