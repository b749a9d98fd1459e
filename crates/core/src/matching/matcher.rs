use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::alias::{AliasSnapshot, AliasTable};
use super::name::normalize;
use super::tier::MatchTier;
use crate::domain::listing::CatalogListing;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Per-signal scores behind a match, each in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    pub name_score: f64,
    pub scientific_name_score: f64,
    pub alias_score: f64,
}

impl ComponentScores {
    pub fn best(&self) -> f64 {
        self.name_score.max(self.scientific_name_score).max(self.alias_score)
    }
}

/// A catalog listing that cleared the threshold for one matching request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub listing: CatalogListing,
    pub similarity: f64,
    pub tier: MatchTier,
    pub component_scores: ComponentScores,
}

/// Bigram (Sørensen–Dice) similarity of two already-normalized names.
/// Equal non-empty names short-circuit to `1.0`; an empty side scores `0.0`.
pub fn similarity(left: &str, right: &str) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }
    strsim::sorensen_dice(left, right)
}

/// Scores catalog listings against an identified plant name.
///
/// Pure apart from reading the alias table: each call works on one alias
/// snapshot, so repeated calls with the same arguments and table state give
/// the same answer.
#[derive(Clone, Debug)]
pub struct FuzzyMatcher {
    aliases: Arc<AliasTable>,
}

impl FuzzyMatcher {
    pub fn new(aliases: Arc<AliasTable>) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &Arc<AliasTable> {
        &self.aliases
    }

    /// Listings whose best score reaches `threshold`, highest similarity
    /// first; equal scores keep catalog order.
    pub fn find_matches(
        &self,
        identified_name: &str,
        listings: &[CatalogListing],
        threshold: f64,
    ) -> Vec<MatchCandidate> {
        self.find_matches_any(&[identified_name], listings, threshold)
    }

    /// Like [`find_matches`](Self::find_matches) but tries several names for the
    /// same plant (e.g. scientific and common) and keeps each listing's best.
    pub fn find_matches_any(
        &self,
        identified_names: &[&str],
        listings: &[CatalogListing],
        threshold: f64,
    ) -> Vec<MatchCandidate> {
        let names: Vec<&str> =
            identified_names.iter().copied().filter(|name| !normalize(name).is_empty()).collect();
        if names.is_empty() || listings.is_empty() {
            return Vec::new();
        }

        let snapshot = self.aliases.snapshot();
        let mut matches: Vec<MatchCandidate> = listings
            .iter()
            .filter_map(|listing| {
                let scores = names
                    .iter()
                    .filter_map(|name| score_listing(&snapshot, name, listing))
                    .max_by(|left, right| left.best().total_cmp(&right.best()))?;
                let similarity = scores.best();
                (similarity >= threshold).then(|| MatchCandidate {
                    listing: listing.clone(),
                    similarity,
                    tier: MatchTier::from_score(similarity),
                    component_scores: scores,
                })
            })
            .collect();

        matches.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));

        debug!(
            event_name = "match.completed",
            listing_count = listings.len(),
            match_count = matches.len(),
            threshold,
            best_similarity = matches.first().map(|candidate| candidate.similarity).unwrap_or(0.0),
            "catalog matching completed"
        );
        matches
    }
}

/// Component scores for one listing, or `None` when the listing carries no
/// usable name at all.
pub fn score_listing(
    aliases: &AliasSnapshot,
    identified_name: &str,
    listing: &CatalogListing,
) -> Option<ComponentScores> {
    let identified = normalize(identified_name);
    let plant_name = normalize(&listing.plant_name);
    let scientific_name = listing.scientific_name.as_deref().map(normalize).unwrap_or_default();
    if identified.is_empty() || (plant_name.is_empty() && scientific_name.is_empty()) {
        return None;
    }

    Some(ComponentScores {
        name_score: similarity(&identified, &plant_name),
        scientific_name_score: similarity(&identified, &scientific_name),
        alias_score: aliases.score(&identified, &plant_name),
    })
}

/// Matches grouped by tier, preserving similarity order inside each tier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    matches: Vec<MatchCandidate>,
}

impl MatchReport {
    pub fn new(matches: Vec<MatchCandidate>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[MatchCandidate] {
        &self.matches
    }

    pub fn by_tier(&self, tier: MatchTier) -> Vec<&MatchCandidate> {
        self.matches.iter().filter(|candidate| candidate.tier == tier).collect()
    }

    pub fn count(&self, tier: MatchTier) -> usize {
        self.matches.iter().filter(|candidate| candidate.tier == tier).count()
    }

    /// Match count per tier, omitting empty tiers.
    pub fn tier_counts(&self) -> BTreeMap<MatchTier, usize> {
        let mut counts = BTreeMap::new();
        for candidate in &self.matches {
            *counts.entry(candidate.tier).or_insert(0) += 1;
        }
        counts
    }

    pub fn best(&self) -> Option<&MatchCandidate> {
        self.matches.first()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn into_matches(self) -> Vec<MatchCandidate> {
        self.matches
    }
}
